// src/processing/reduce.rs
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::collection::ImageCollection;
use crate::error::{EeiError, Result};
use crate::geometry::Region;
use crate::raster::{is_nodata, Raster, NODATA};

/// Metres per degree of latitude, used to turn a sampling scale into a pixel stride
const METRES_PER_DEGREE: f64 = 111_320.0;

/// Aggregation applied across time or across a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reducer {
    Mean,
    Min,
    Max,
}

impl Reducer {
    /// Reduce valid samples; `None` when there are none
    pub fn reduce<I: IntoIterator<Item = f64>>(&self, values: I) -> Option<f64> {
        let mut values = values.into_iter();
        let first = values.next()?;
        Some(match self {
            Reducer::Mean => {
                let (sum, count) = values.fold((first, 1usize), |(s, n), v| (s + v, n + 1));
                sum / count as f64
            }
            Reducer::Min => values.fold(first, f64::min),
            Reducer::Max => values.fold(first, f64::max),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Reducer::Mean => "mean",
            Reducer::Min => "min",
            Reducer::Max => "max",
        }
    }
}

/// Per-pixel reduction of one band across every image of a collection.
///
/// NoData samples are skipped; a pixel with no valid sample stays NoData.
pub fn reduce_temporal(collection: &ImageCollection, band: &str, reducer: Reducer) -> Result<Raster> {
    if collection.is_empty() {
        return Err(EeiError::EmptyCollection(band.to_string()));
    }

    let rasters = collection.band_series(band)?;
    let reference = rasters[0];
    for raster in &rasters[1..] {
        reference.ensure_same_shape(raster)?;
    }

    let data: Vec<f32> = (0..reference.data().len())
        .into_par_iter()
        .map(|i| {
            let samples = rasters
                .iter()
                .map(|r| r.data()[i])
                .filter(|v| !is_nodata(*v))
                .map(f64::from);
            reducer.reduce(samples).map_or(NODATA, |v| v as f32)
        })
        .collect();

    reference.with_data(data)
}

/// Pixel stride that approximates a sampling scale in metres
pub fn sampling_stride(raster: &Raster, scale: f64) -> usize {
    let transform = raster.transform();
    let (_, lat) = transform.pixel_center(raster.width() / 2, raster.height() / 2);
    let cell_metres = transform.pixel_width.abs() * METRES_PER_DEGREE * lat.to_radians().cos();

    if !(scale.is_finite() && cell_metres.is_finite()) || cell_metres <= 0.0 {
        return 1;
    }
    ((scale / cell_metres).round() as usize).max(1)
}

/// Reduce the valid pixels whose centres fall inside the region
pub fn reduce_region(raster: &Raster, region: &Region, reducer: Reducer, scale: f64) -> Option<f64> {
    let stride = sampling_stride(raster, scale);
    let transform = raster.transform();
    let width = raster.width();
    let data = raster.data();

    let samples = (0..raster.height())
        .step_by(stride)
        .flat_map(|row| (0..width).step_by(stride).map(move |col| (col, row)))
        .filter(|&(col, row)| {
            let (x, y) = transform.pixel_center(col, row);
            region.contains(x, y)
        })
        .map(|(col, row)| data[row * width + col])
        .filter(|v| !is_nodata(*v))
        .map(f64::from);

    reducer.reduce(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{Image, SceneInfo};
    use crate::raster::GeoTransform;
    use chrono::NaiveDate;
    use geo::Rect;

    fn image(id: &str, values: Vec<f32>) -> Image {
        let info = SceneInfo {
            id: id.to_string(),
            collection: "test".to_string(),
            date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            footprint: Rect::new((45.0, 37.4), (45.6, 37.8)),
            bands: vec!["NDWI".to_string()],
        };
        let transform = GeoTransform::new(45.0, 37.8, 0.3, -0.2);
        let raster = Raster::new((2, 2), values, transform).unwrap();
        Image::new(info, vec![("NDWI".to_string(), raster)])
    }

    #[test]
    fn reducers_on_plain_values() {
        assert_eq!(Reducer::Mean.reduce([1.0, 2.0, 6.0]), Some(3.0));
        assert_eq!(Reducer::Min.reduce([4.0, -1.0, 2.0]), Some(-1.0));
        assert_eq!(Reducer::Max.reduce([4.0, -1.0, 2.0]), Some(4.0));
        assert_eq!(Reducer::Mean.reduce(std::iter::empty()), None);
    }

    #[test]
    fn temporal_mean_skips_nodata() {
        let collection = ImageCollection::new(vec![
            image("a", vec![0.2, NODATA, 0.4, NODATA]),
            image("b", vec![0.4, 0.1, NODATA, NODATA]),
        ]);
        let mean = reduce_temporal(&collection, "NDWI", Reducer::Mean).unwrap();
        let data = mean.data();
        assert!((data[0] - 0.3).abs() < 1e-6);
        assert!((data[1] - 0.1).abs() < 1e-6);
        assert!((data[2] - 0.4).abs() < 1e-6);
        assert_eq!(data[3], NODATA);
    }

    #[test]
    fn empty_collection_is_error() {
        let result = reduce_temporal(&ImageCollection::default(), "NDWI", Reducer::Mean);
        assert!(matches!(result, Err(EeiError::EmptyCollection(_))));
    }

    #[test]
    fn missing_band_is_error() {
        let collection = ImageCollection::new(vec![image("a", vec![0.0; 4])]);
        let result = reduce_temporal(&collection, "sur_refl_b03", Reducer::Mean);
        assert!(matches!(result, Err(EeiError::MissingBand { .. })));
    }

    #[test]
    fn region_mean_over_valid_pixels() {
        let region = Region::lake_urmia();
        let raster = image("a", vec![0.2, 0.4, NODATA, 0.6]).band("NDWI").unwrap().clone();
        let mean = reduce_region(&raster, &region, Reducer::Mean, 30.0).unwrap();
        assert!((mean - 0.4).abs() < 1e-6);
    }

    #[test]
    fn coarse_scale_strides_over_pixels() {
        let transform = GeoTransform::new(45.0, 37.8, 0.0003, -0.0003);
        let raster = Raster::filled((10, 10), 1.0, transform);
        // ~26 m cells at 37.8N
        assert_eq!(sampling_stride(&raster, 30.0), 1);
        assert_eq!(sampling_stride(&raster, 120.0), 5);
    }
}
