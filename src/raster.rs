// src/raster.rs
use serde::{Deserialize, Serialize};

use crate::error::{EeiError, Result};

/// NoData marker shared by every raster the pipeline produces
pub const NODATA: f32 = -999.0;

/// Returns true for the NoData marker and for NaN cells
#[inline]
pub fn is_nodata(value: f32) -> bool {
    value == NODATA || value.is_nan()
}

/// North-up affine transform in GDAL coefficient order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub origin_y: f64,
    /// Negative for north-up rasters
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            origin_y,
            pixel_height,
        }
    }

    /// Build from `[origin_x, pixel_width, 0, origin_y, 0, pixel_height]`
    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        Self::new(coeffs[0], coeffs[3], coeffs[1], coeffs[5])
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            0.0,
            self.origin_y,
            0.0,
            self.pixel_height,
        ]
    }

    /// Geographic coordinate of the centre of pixel (col, row)
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            self.origin_y + (row as f64 + 0.5) * self.pixel_height,
        )
    }

    /// Fractional pixel position of a geographic coordinate
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_width,
            (y - self.origin_y) / self.pixel_height,
        )
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

/// Single-band float raster, row-major, shape is (width, height)
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    shape: (usize, usize),
    data: Vec<f32>,
    transform: GeoTransform,
}

impl Raster {
    pub fn new(shape: (usize, usize), data: Vec<f32>, transform: GeoTransform) -> Result<Self> {
        if data.len() != shape.0 * shape.1 {
            return Err(EeiError::SizeMismatch {
                expected: shape,
                actual: (data.len(), 1),
            });
        }
        Ok(Self {
            shape,
            data,
            transform,
        })
    }

    pub fn filled(shape: (usize, usize), value: f32, transform: GeoTransform) -> Self {
        Self {
            shape,
            data: vec![value; shape.0 * shape.1],
            transform,
        }
    }

    /// Same grid as `self`, new pixel values
    pub fn with_data(&self, data: Vec<f32>) -> Result<Self> {
        Self::new(self.shape, data, self.transform)
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn width(&self) -> usize {
        self.shape.0
    }

    pub fn height(&self) -> usize {
        self.shape.1
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn ensure_same_shape(&self, other: &Raster) -> Result<()> {
        if self.shape != other.shape {
            return Err(EeiError::SizeMismatch {
                expected: self.shape,
                actual: other.shape,
            });
        }
        Ok(())
    }

    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !is_nodata(**v)).count()
    }

    /// Value of the pixel containing (x, y); `Ok(None)` for a NoData pixel
    pub fn sample(&self, x: f64, y: f64) -> Result<Option<f64>> {
        let (px, py) = self.transform.geo_to_pixel(x, y);
        if px < 0.0 || py < 0.0 || px >= self.width() as f64 || py >= self.height() as f64 {
            return Err(EeiError::PointOutside { x, y });
        }
        let value = self.data[py as usize * self.width() + px as usize];
        Ok((!is_nodata(value)).then_some(value as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Raster {
        // 3x2 raster anchored at (45.0, 37.8) with 0.2 degree pixels
        let transform = GeoTransform::new(45.0, 37.8, 0.2, -0.2);
        Raster::new((3, 2), vec![1.0, 2.0, 3.0, 4.0, NODATA, 6.0], transform).unwrap()
    }

    #[test]
    fn rejects_wrong_length() {
        let result = Raster::new((2, 2), vec![0.0; 3], GeoTransform::default());
        assert!(matches!(result, Err(EeiError::SizeMismatch { .. })));
    }

    #[test]
    fn samples_pixel_containing_point() {
        let raster = grid();
        assert_eq!(raster.sample(45.1, 37.7).unwrap(), Some(1.0));
        assert_eq!(raster.sample(45.5, 37.5).unwrap(), Some(6.0));
        assert_eq!(raster.sample(45.3, 37.5).unwrap(), None);
    }

    #[test]
    fn sample_outside_is_error() {
        let raster = grid();
        assert!(matches!(
            raster.sample(44.0, 37.7),
            Err(EeiError::PointOutside { .. })
        ));
    }

    #[test]
    fn gdal_round_trip_of_transform() {
        let transform = GeoTransform::new(45.0, 37.8, 0.01, -0.01);
        assert_eq!(GeoTransform::from_gdal(transform.to_gdal()), transform);
    }

    #[test]
    fn pixel_center_is_half_a_cell_in() {
        let transform = GeoTransform::new(45.0, 37.8, 0.2, -0.2);
        let (x, y) = transform.pixel_center(0, 0);
        assert!((x - 45.1).abs() < 1e-12);
        assert!((y - 37.7).abs() < 1e-12);
    }

    #[test]
    fn counts_valid_cells() {
        assert_eq!(grid().valid_count(), 5);
    }
}
