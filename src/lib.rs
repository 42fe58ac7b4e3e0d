// src/lib.rs
pub mod analysis;
pub mod cli;
pub mod collection;
pub mod config;
pub mod dashboard;
pub mod dates;
pub mod eei;
pub mod error;
pub mod geometry;
pub mod io;
pub mod lazy;
pub mod processing;
pub mod raster;
pub mod source;
pub mod ui;
pub mod utils;

pub use error::{EeiError, Result};

/// Crate version, recorded in published dashboards
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
