// src/processing/mod.rs
pub mod band_math;
pub mod clip;
pub mod indices;
pub mod parallel;
pub mod reduce;

// Re-export main components
pub use band_math::BandMathOp;
pub use parallel::{IndexCalculator, ParallelProcessor};
pub use reduce::Reducer;
