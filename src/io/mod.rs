// src/io/mod.rs
pub mod reader;
pub mod writer;

pub use reader::read_band;
pub use writer::{write_raster, WriteOptions};
