// src/utils/fixed_point.rs
use crate::error::{EeiError, Result};
use crate::raster::is_nodata;

/// Integer NoData used by fixed-point exports
pub const FIXED_POINT_NODATA: i16 = i16::MIN;

const LOWEST: f32 = (i16::MIN as f32) + 1.0;
const HIGHEST: f32 = i16::MAX as f32;

/// Scale float pixels to int16.
///
/// Readers recover the float value as `stored / scale_factor`. A valid pixel
/// whose scaled value does not fit in int16 is an error.
pub fn to_fixed_point(data: &[f32], scale_factor: i32, nodata_value: i16) -> Result<Vec<i16>> {
    data.iter()
        .map(|&value| {
            if is_nodata(value) {
                return Ok(nodata_value);
            }
            let scaled = (value * scale_factor as f32).round();
            if !(LOWEST..=HIGHEST).contains(&scaled) {
                return Err(EeiError::ConfigInvalid {
                    key: "scale_factor".to_string(),
                    reason: format!("{value} scaled by {scale_factor} does not fit in int16"),
                });
            }
            Ok(scaled as i16)
        })
        .collect()
}

/// Largest scale, dividing `requested` by 10 at a time, that keeps every
/// valid pixel within int16
pub fn fit_scale_factor(data: &[f32], requested: i32) -> i32 {
    let max_abs = data
        .iter()
        .filter(|v| !is_nodata(**v))
        .fold(0.0f32, |acc, v| acc.max(v.abs()));

    let mut scale = requested.max(1);
    while scale > 1 && (max_abs * scale as f32).round() > HIGHEST {
        scale /= 10;
    }
    scale.max(1)
}
