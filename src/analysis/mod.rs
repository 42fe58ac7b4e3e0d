// src/analysis/mod.rs
//! Site-level EEI from tabular observations, and change detection on the
//! resulting series.

pub mod cusum;
pub mod sites;

pub use cusum::{cusum, Cusum};
pub use sites::{read_sites, score_sites, write_sites, SiteRecord, SiteScore};
