// src/processing/band_math.rs
use rayon::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::raster::{is_nodata, Raster, NODATA};

/// Binary operations available to raster expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BandMathOp {
    Add,
    Multiply,
}

impl BandMathOp {
    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            BandMathOp::Add => a + b,
            BandMathOp::Multiply => a * b,
        }
    }
}

/// Combine two rasters cell by cell. NoData in either input gives NoData.
pub fn band_math_binary(a: &Raster, b: &Raster, op: BandMathOp) -> Result<Raster> {
    a.ensure_same_shape(b)?;

    let data: Vec<f32> = a
        .data()
        .par_iter()
        .zip(b.data().par_iter())
        .map(|(&va, &vb)| {
            if is_nodata(va) || is_nodata(vb) {
                NODATA
            } else {
                op.apply(va as f64, vb as f64) as f32
            }
        })
        .collect();

    a.with_data(data)
}

/// Combine a raster with a constant, which broadcasts over the grid
pub fn band_math_scalar(raster: &Raster, constant: f64, op: BandMathOp) -> Result<Raster> {
    let data: Vec<f32> = raster
        .data()
        .par_iter()
        .map(|&v| {
            if is_nodata(v) {
                NODATA
            } else {
                op.apply(v as f64, constant) as f32
            }
        })
        .collect();

    raster.with_data(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::GeoTransform;

    fn raster(values: &[f32]) -> Raster {
        Raster::new((values.len(), 1), values.to_vec(), GeoTransform::default()).unwrap()
    }

    #[test]
    fn binary_add_keeps_nodata() {
        let a = raster(&[1.0, NODATA, 3.0]);
        let b = raster(&[0.5, 1.0, NODATA]);
        let sum = band_math_binary(&a, &b, BandMathOp::Add).unwrap();
        assert_eq!(sum.data(), &[1.5, NODATA, NODATA]);
    }

    #[test]
    fn scalar_multiply_broadcasts() {
        let a = raster(&[0.5, -0.5, NODATA]);
        let scaled = band_math_scalar(&a, 0.5, BandMathOp::Multiply).unwrap();
        assert_eq!(scaled.data(), &[0.25, -0.25, NODATA]);
    }

    #[test]
    fn binary_rejects_mismatched_grids() {
        let a = raster(&[1.0, 2.0]);
        let b = raster(&[1.0, 2.0, 3.0]);
        assert!(band_math_binary(&a, &b, BandMathOp::Multiply).is_err());
    }
}
