// src/error.rs
use thiserror::Error;

/// Errors raised while querying, reducing or publishing EEI rasters
#[derive(Debug, Error)]
pub enum EeiError {
    #[error("Unknown image collection: {0}")]
    UnknownCollection(String),

    #[error("Image {image} has no band named {band}")]
    MissingBand { image: String, band: String },

    #[error("Collection is empty after filtering: {0}")]
    EmptyCollection(String),

    #[error("Raster size mismatch: expected {expected:?}, got {actual:?}")]
    SizeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid date range {start}..{end}: {reason}")]
    InvalidDateRange {
        start: String,
        end: String,
        reason: String,
    },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    #[error("Point ({x}, {y}) lies outside the raster")]
    PointOutside { x: f64, y: f64 },

    #[error("Scene not found: {0}")]
    SceneNotFound(String),

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

pub type Result<T> = std::result::Result<T, EeiError>;
