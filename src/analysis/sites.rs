// src/analysis/sites.rs
//! Site table EEI.
//!
//! Input rows carry raw observations per site and year. Each measurement is
//! scaled to `[0, 10]` against a fixed maximum, and the index is
//!
//! ```text
//! EEI = H + 0.5 * salinity_norm + 0.3 * biodiversity_norm + 0.2 * energy_flow_norm
//! ```
//!
//! where `H` is the Shannon entropy of the site's species counts.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EeiError, Result};

use super::cusum::{cusum, Cusum};

pub const SALINITY_MAX: f64 = 310.0;
pub const BIODIVERSITY_MAX: f64 = 2.5;
pub const ENERGY_FLOW_MAX: f64 = 1200.0;

/// Keeps `ln` finite when a proportion is zero
const ENTROPY_EPSILON: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    #[serde(alias = "Year")]
    pub year: i32,
    #[serde(alias = "Location")]
    pub location: String,
    /// g/L; missing readings count as 0
    #[serde(alias = "Salinity", default)]
    pub salinity: Option<f64>,
    /// Shannon index
    #[serde(alias = "Biodiversity")]
    pub biodiversity: f64,
    /// MJ/m²
    #[serde(alias = "Energy_Flow")]
    pub energy_flow: f64,
    /// Individuals per species, separated by `;`
    #[serde(alias = "Species_Counts", default)]
    pub species_counts: Option<String>,
}

impl SiteRecord {
    pub fn counts(&self) -> Result<Vec<f64>> {
        let Some(raw) = self.species_counts.as_deref() else {
            return Ok(Vec::new());
        };
        raw.split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<f64>().map_err(|e| EeiError::ConfigInvalid {
                    key: format!("species_counts ({} {})", self.location, self.year),
                    reason: format!("{s:?}: {e}"),
                })
            })
            .collect()
    }
}

/// Input columns followed by the computed ones
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteScore {
    pub year: i32,
    pub location: String,
    pub salinity: Option<f64>,
    pub biodiversity: f64,
    pub energy_flow: f64,
    pub species_counts: Option<String>,
    pub salinity_norm: f64,
    pub biodiversity_norm: f64,
    pub energy_flow_norm: f64,
    pub shannon_entropy: f64,
    pub eei: f64,
    pub cusum_pos: f64,
    pub cusum_neg: f64,
}

/// Scale to `[0, 10]` against `max`
pub fn normalize(value: f64, max: f64) -> f64 {
    value / max * 10.0
}

/// `-Σ p ln(p)` over the count proportions; 0 for no counts or a zero total
pub fn shannon_entropy(counts: &[f64]) -> f64 {
    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    -counts
        .iter()
        .map(|c| {
            let p = c / total;
            p * (p + ENTROPY_EPSILON).ln()
        })
        .sum::<f64>()
}

pub fn site_eei(entropy: f64, salinity_norm: f64, biodiversity_norm: f64, energy_flow_norm: f64) -> f64 {
    entropy + 0.5 * salinity_norm + 0.3 * biodiversity_norm + 0.2 * energy_flow_norm
}

/// Score every row, then run CUSUM over the EEI column in row order
pub fn score_sites(records: Vec<SiteRecord>, params: Cusum) -> Result<Vec<SiteScore>> {
    let mut scores = records
        .into_iter()
        .map(|record| -> Result<SiteScore> {
            let salinity_norm = normalize(record.salinity.unwrap_or(0.0), SALINITY_MAX);
            let biodiversity_norm = normalize(record.biodiversity, BIODIVERSITY_MAX);
            let energy_flow_norm = normalize(record.energy_flow, ENERGY_FLOW_MAX);
            let shannon_entropy = shannon_entropy(&record.counts()?);
            Ok(SiteScore {
                eei: site_eei(shannon_entropy, salinity_norm, biodiversity_norm, energy_flow_norm),
                year: record.year,
                location: record.location,
                salinity: record.salinity,
                biodiversity: record.biodiversity,
                energy_flow: record.energy_flow,
                species_counts: record.species_counts,
                salinity_norm,
                biodiversity_norm,
                energy_flow_norm,
                shannon_entropy,
                cusum_pos: 0.0,
                cusum_neg: 0.0,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let eei: Vec<f64> = scores.iter().map(|s| s.eei).collect();
    let (upper, lower) = cusum(&eei, params);
    for ((score, pos), neg) in scores.iter_mut().zip(upper).zip(lower) {
        score.cusum_pos = pos;
        score.cusum_neg = neg;
    }
    Ok(scores)
}

pub fn read_sites(path: &Path) -> Result<Vec<SiteRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<SiteRecord>, _>>()?;
    info!(path = %path.display(), rows = records.len(), "Read site table");
    Ok(records)
}

pub fn write_sites(path: &Path, scores: &[SiteScore]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for score in scores {
        writer.serialize(score)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = scores.len(), "Wrote site scores");
    Ok(())
}
