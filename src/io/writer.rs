// src/io/writer.rs
use std::path::Path;

use crate::error::Result;
use crate::raster::{Raster, NODATA};
use crate::utils::fixed_point::{to_fixed_point, FIXED_POINT_NODATA};

#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Write int16 scaled by `scale_factor` instead of float32
    pub use_fixed_point: bool,
    pub scale_factor: i32,
    pub description: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            use_fixed_point: false,
            scale_factor: 10000,
            description: String::new(),
        }
    }
}

#[cfg(not(feature = "gdal"))]
pub fn write_raster(raster: &Raster, output_path: &Path, options: &WriteOptions) -> Result<()> {
    use std::fs::File;
    use std::io::{BufWriter, Seek, Write};
    use tiff::encoder::colortype::{Gray32Float, GrayI16};
    use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind};
    use tiff::tags::Tag;

    use super::reader::{GDAL_NODATA_TAG, MODEL_PIXEL_SCALE_TAG, MODEL_TIEPOINT_TAG};

    fn write_geo_tags<W: Write + Seek, K: TiffKind>(
        directory: &mut DirectoryEncoder<'_, W, K>,
        raster: &Raster,
        nodata: &str,
        description: &str,
    ) -> Result<()> {
        let gt = raster.transform();
        let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
        let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
        // Version 1.1.0, 3 keys: geographic model, pixel-is-area, WGS 84
        let geokeys: [u16; 16] = [
            1, 1, 0, 3, 1024, 0, 1, 2, 1025, 0, 1, 1, 2048, 0, 1, 4326,
        ];

        directory.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE_TAG), &scale[..])?;
        directory.write_tag(Tag::Unknown(MODEL_TIEPOINT_TAG), &tiepoint[..])?;
        directory.write_tag(Tag::Unknown(34735), &geokeys[..])?;
        directory.write_tag(Tag::Unknown(GDAL_NODATA_TAG), nodata)?;
        if !description.is_empty() {
            directory.write_tag(Tag::ImageDescription, description)?;
        }
        Ok(())
    }

    let (width, height) = (raster.width() as u32, raster.height() as u32);
    let mut encoder = TiffEncoder::new(BufWriter::new(File::create(output_path)?))?;

    if options.use_fixed_point {
        let fixed_data = to_fixed_point(raster.data(), options.scale_factor, FIXED_POINT_NODATA)?;
        let description = format!(
            "{} (scaled by {})",
            options.description, options.scale_factor
        );

        let mut image = encoder.new_image::<GrayI16>(width, height)?;
        write_geo_tags(
            image.encoder(),
            raster,
            &FIXED_POINT_NODATA.to_string(),
            &description,
        )?;
        image.write_data(&fixed_data)?;
    } else {
        let mut image = encoder.new_image::<Gray32Float>(width, height)?;
        write_geo_tags(
            image.encoder(),
            raster,
            &NODATA.to_string(),
            &options.description,
        )?;
        image.write_data(raster.data())?;
    }

    Ok(())
}

#[cfg(feature = "gdal")]
pub fn write_raster(raster: &Raster, output_path: &Path, options: &WriteOptions) -> Result<()> {
    use gdal::raster::{Buffer, RasterCreationOptions};
    use gdal::spatial_ref::SpatialRef;
    use gdal::{DriverManager, Metadata};

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let (width, height) = raster.shape();

    let creation_options = RasterCreationOptions::from_iter([
        "COMPRESS=DEFLATE",
        "TILED=YES",
        "NUM_THREADS=ALL_CPUS",
    ]);
    let srs = SpatialRef::from_epsg(4326)?;

    if options.use_fixed_point {
        // Create int16 output
        let mut out_ds = driver.create_with_band_type_with_options::<i16, _>(
            output_path,
            width,
            height,
            1,
            &creation_options,
        )?;

        out_ds.set_spatial_ref(&srs)?;
        out_ds.set_geo_transform(&raster.transform().to_gdal())?;

        let mut band = out_ds.rasterband(1)?;
        band.set_no_data_value(Some(FIXED_POINT_NODATA as f64))?;
        band.set_metadata_item("SCALE", &format!("{}", 1.0 / options.scale_factor as f64), "")?;
        band.set_metadata_item("OFFSET", "0", "")?;
        band.set_description(&format!(
            "{} (scaled by {})",
            options.description, options.scale_factor
        ))?;

        let fixed_data = to_fixed_point(raster.data(), options.scale_factor, FIXED_POINT_NODATA)?;
        let mut buffer = Buffer::new((width, height), fixed_data);
        band.write((0, 0), (width, height), &mut buffer)?;

        out_ds.flush_cache()?;
    } else {
        // Create float32 output
        let mut out_ds = driver.create_with_band_type_with_options::<f32, _>(
            output_path,
            width,
            height,
            1,
            &creation_options,
        )?;

        out_ds.set_spatial_ref(&srs)?;
        out_ds.set_geo_transform(&raster.transform().to_gdal())?;

        let mut band = out_ds.rasterband(1)?;
        band.set_no_data_value(Some(NODATA as f64))?;
        band.set_description(&options.description)?;

        let mut buffer = Buffer::new((width, height), raster.data().to_vec());
        band.write((0, 0), (width, height), &mut buffer)?;

        out_ds.flush_cache()?;
    }

    Ok(())
}
