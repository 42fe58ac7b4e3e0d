// src/processing/clip.rs
use rayon::prelude::*;

use crate::error::Result;
use crate::geometry::Region;
use crate::raster::{Raster, NODATA};

/// Set every pixel whose centre lies outside the region to NoData.
///
/// The grid is kept as is so the clipped raster stays aligned with its input.
pub fn clip(raster: &Raster, region: &Region) -> Result<Raster> {
    let width = raster.width();
    let transform = *raster.transform();

    let data: Vec<f32> = raster
        .data()
        .par_iter()
        .enumerate()
        .map(|(i, &value)| {
            let (x, y) = transform.pixel_center(i % width, i / width);
            if region.contains(x, y) {
                value
            } else {
                NODATA
            }
        })
        .collect();

    raster.with_data(data)
}
