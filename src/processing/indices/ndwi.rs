// src/processing/indices/ndwi.rs
use crate::error::Result;
use crate::processing::parallel::IndexCalculator;
use crate::raster::{is_nodata, Raster, NODATA};
use rayon::prelude::*;

/// Normalized Difference Water Index (NDWI) calculator
///
/// `(A - B) / (A + B)` over two named bands. The Lake Urmia salinity proxy
/// reads MODIS `sur_refl_b03` and `sur_refl_b05`.
pub struct NDWI {
    bands: [String; 2],
    name: String,
}

impl NDWI {
    pub fn new(first_band: &str, second_band: &str, name: Option<String>) -> Self {
        Self {
            bands: [first_band.to_string(), second_band.to_string()],
            name: name.unwrap_or_else(|| "NDWI".to_string()),
        }
    }
}

impl IndexCalculator for NDWI {
    fn calculate(&self, inputs: &[&Raster]) -> Result<Raster> {
        let first = inputs[0];
        let second = inputs[1];
        first.ensure_same_shape(second)?;

        let first_band = first.data();
        let second_band = second.data();

        // Preallocate result buffer
        let mut result_data = vec![0.0f32; first_band.len()];

        result_data.par_iter_mut().enumerate().for_each(|(i, result)| {
            let a = first_band[i];
            let b = second_band[i];

            *result = if is_nodata(a) || is_nodata(b) || a + b == 0.0 {
                NODATA
            } else {
                (a - b) / (a + b)
            };
        });

        first.with_data(result_data)
    }

    fn required_bands(&self) -> &[String] {
        &self.bands
    }

    fn name(&self) -> &str {
        &self.name
    }
}
