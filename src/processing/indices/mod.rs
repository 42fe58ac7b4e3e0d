// src/processing/indices/mod.rs
pub mod ndwi;

// Re-export indices
pub use ndwi::NDWI;
