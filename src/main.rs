// src/main.rs
use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use urmia_eei::analysis::{read_sites, score_sites, write_sites, Cusum};
use urmia_eei::cli::{write_options, Cli, Commands};
use urmia_eei::config::DashboardConfig;
use urmia_eei::dashboard::build_dashboard;
use urmia_eei::eei::eei_value;
use urmia_eei::lazy::EvalContext;
use urmia_eei::processing::ParallelProcessor;
use urmia_eei::source::CatalogSource;
use urmia_eei::ui::{PublishOptions, SeriesAggregation};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DashboardConfig::default(),
    };

    match &cli.command {
        Commands::Run {
            catalog,
            float,
            fixed_point,
            scale_factor,
            yearly,
            base_url,
            io_threads,
        } => {
            if *yearly {
                config.chart.aggregation = SeriesAggregation::Yearly;
            }
            if base_url.is_some() {
                config.base_url = base_url.clone();
            }
            if io_threads.is_some() {
                config.io_threads = *io_threads;
            }
            config.validate().context("Invalid configuration")?;

            let source = CatalogSource::open(catalog)
                .with_context(|| format!("Failed to open catalog {}", catalog.display()))?;
            let ctx = EvalContext::new(&source, ParallelProcessor::new(config.io_threads));

            let dashboard = build_dashboard(&config, &ctx).context("Failed to build dashboard")?;
            let options = PublishOptions {
                base_url: config.base_url.clone(),
                write: write_options(*float, *fixed_point, *scale_factor),
            };
            let url = dashboard
                .publish(&ctx, &cli.output, &options)
                .context("Failed to publish dashboard")?;

            println!("Dashboard URL: {url}");
        }
        Commands::Eei { salinity } => {
            config.placeholders.validate()?;
            println!("{:.4}", eei_value(*salinity, &config.placeholders));
        }
        Commands::Sites {
            input,
            scores,
            window,
            threshold,
        } => {
            let records = read_sites(input)
                .with_context(|| format!("Failed to read site table {}", input.display()))?;
            let params = Cusum {
                window: *window,
                threshold: *threshold,
            };
            let scored = score_sites(records, params)?;

            let path = match scores {
                Some(path) => path.clone(),
                None => {
                    fs::create_dir_all(&cli.output)?;
                    cli.output.join("eei_results.csv")
                }
            };
            write_sites(&path, &scored)?;
            info!(path = %path.display(), "Site scores written");

            for score in &scored {
                println!("{} {}: EEI {:.2}", score.year, score.location, score.eei);
            }
        }
        Commands::Check => {
            config.validate().context("Invalid configuration")?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
