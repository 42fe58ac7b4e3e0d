use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::io::WriteOptions;

#[derive(Parser)]
#[command(name = "urmia-eei")]
#[command(about = "Ecosystem Exploitation Index pipeline and dashboard for Lake Urmia")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON configuration; defaults cover Lake Urmia
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "dashboard", global = true)]
    pub output: PathBuf,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline against a scene catalog and publish the dashboard
    Run {
        /// Directory holding catalog.json and the band GeoTIFFs
        #[arg(long)]
        catalog: PathBuf,

        /// Write layer GeoTIFFs as float32 (default)
        #[arg(long, overrides_with = "fixed_point")]
        float: bool,

        /// Write layer GeoTIFFs as int16 scaled by --scale-factor
        #[arg(long, overrides_with = "float")]
        fixed_point: bool,

        /// Largest fixed-point scale; a layer that would overflow int16 uses a smaller power of ten
        #[arg(long, default_value = "10000")]
        scale_factor: i32,

        /// One chart point per calendar year instead of per scene
        #[arg(long)]
        yearly: bool,

        /// Publish under this URL instead of a file:// URL
        #[arg(long)]
        base_url: Option<String>,

        /// Scene loading threads
        #[arg(long)]
        io_threads: Option<usize>,
    },

    /// EEI for a single salinity value
    Eei {
        /// Salinity proxy (mean NDWI)
        #[arg(short, long, allow_negative_numbers = true)]
        salinity: f64,
    },

    /// Score a site table: normalization, Shannon entropy, EEI and CUSUM
    Sites {
        /// CSV with year, location, salinity, biodiversity, energy_flow
        #[arg(short, long)]
        input: PathBuf,

        /// Scored CSV; defaults to eei_results.csv in the output directory
        #[arg(long = "scores")]
        scores: Option<PathBuf>,

        /// CUSUM trailing mean window
        #[arg(long, default_value = "10")]
        window: usize,

        /// CUSUM slack
        #[arg(long, default_value = "5.0")]
        threshold: f64,
    },

    /// Validate the configuration and print it
    Check,
}

/// GeoTIFF encoding for `run`; of `--float` and `--fixed-point` the last one given wins
pub fn write_options(float: bool, fixed_point: bool, scale_factor: i32) -> WriteOptions {
    WriteOptions {
        use_fixed_point: fixed_point && !float,
        scale_factor,
        ..WriteOptions::default()
    }
}
