// src/io/reader.rs
use std::path::Path;

use crate::error::Result;
use crate::raster::{GeoTransform, Raster, NODATA};

/// GeoTIFF tag holding the pixel size
pub(crate) const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
/// GeoTIFF tag anchoring a raster coordinate to a model coordinate
pub(crate) const MODEL_TIEPOINT_TAG: u16 = 33922;
/// GDAL's ASCII NoData tag
pub(crate) const GDAL_NODATA_TAG: u16 = 42113;

/// Map a source NoData value onto the pipeline's marker
fn normalize_nodata(data: &mut [f32], nodata: Option<f64>) {
    if let Some(nodata) = nodata {
        for value in data.iter_mut() {
            if (*value as f64 - nodata).abs() < f64::EPSILON || value.is_nan() {
                *value = NODATA;
            }
        }
    }
}

/// Read band 1 of a GeoTIFF as float pixels
#[cfg(not(feature = "gdal"))]
pub fn read_band(path: &Path) -> Result<Raster> {
    use std::fs::File;
    use std::io::BufReader;
    use tiff::decoder::{Decoder, DecodingResult};
    use tiff::tags::Tag;

    use crate::error::EeiError;

    let mut decoder = Decoder::new(BufReader::new(File::open(path)?))?;
    let (width, height) = decoder.dimensions()?;

    let transform = {
        let scale = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_PIXEL_SCALE_TAG)).ok();
        let tiepoint = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_TIEPOINT_TAG)).ok();
        match (scale, tiepoint) {
            // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
            (Some(scale), Some(tiepoint)) if scale.len() >= 2 && tiepoint.len() >= 6 => {
                GeoTransform::new(
                    tiepoint[3] - tiepoint[0] * scale[0],
                    tiepoint[4] + tiepoint[1] * scale[1],
                    scale[0],
                    -scale[1],
                )
            }
            _ => GeoTransform::default(),
        }
    };

    let nodata = decoder
        .get_tag_ascii_string(Tag::Unknown(GDAL_NODATA_TAG))
        .ok()
        .and_then(|s| s.trim_end_matches('\0').trim().parse::<f64>().ok());

    let mut data: Vec<f32> = match decoder.read_image()? {
        DecodingResult::F32(buf) => buf,
        DecodingResult::F64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U8(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        _ => {
            return Err(EeiError::UnsupportedDataType(format!(
                "unsupported TIFF pixel format in {}",
                path.display()
            )))
        }
    };
    normalize_nodata(&mut data, nodata);

    Raster::new((width as usize, height as usize), data, transform)
}

/// Read band 1 of any GDAL-readable raster as float pixels
#[cfg(feature = "gdal")]
pub fn read_band(path: &Path) -> Result<Raster> {
    use gdal::Dataset;

    let dataset = Dataset::open(path)?;
    let (width, height) = dataset.raster_size();
    let transform = GeoTransform::from_gdal(dataset.geo_transform()?);

    let band = dataset.rasterband(1)?;
    let nodata = band.no_data_value();
    let buffer = band.read_as::<f32>((0, 0), (width, height), (width, height), None)?;

    let mut data = buffer.data().to_vec();
    normalize_nodata(&mut data, nodata);

    Raster::new((width, height), data, transform)
}
