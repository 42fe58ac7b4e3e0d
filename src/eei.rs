// src/eei.rs
//! Ecosystem Exploitation Index.
//!
//! `EEI = biodiversity + salinity*0.5 + biodiversity*0.3 + energy_flow*(0.2/1200*10)`
//!
//! The weights are fixed. Biodiversity, energy flow and migration impact are
//! placeholders standing in for measurements the pipeline does not ingest.

use serde::{Deserialize, Serialize};

use crate::error::{EeiError, Result};
use crate::lazy::RasterHandle;

pub const SALINITY_WEIGHT: f64 = 0.5;
pub const BIODIVERSITY_WEIGHT: f64 = 0.3;
pub const ENERGY_FLOW_WEIGHT: f64 = 0.2 / 1200.0 * 10.0;

/// Placeholder inputs to the index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placeholders {
    /// Shannon index for 2024
    #[serde(default = "default_biodiversity")]
    pub biodiversity: f64,
    /// MJ/m² for 2024
    #[serde(default = "default_energy_flow")]
    pub energy_flow: f64,
    /// Impact of migration on the urban EEI, shown as a label only
    #[serde(default = "default_migration_impact")]
    pub migration_impact: f64,
}

fn default_biodiversity() -> f64 {
    1.1
}

fn default_energy_flow() -> f64 {
    1200.0
}

fn default_migration_impact() -> f64 {
    0.3
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            biodiversity: default_biodiversity(),
            energy_flow: default_energy_flow(),
            migration_impact: default_migration_impact(),
        }
    }
}

impl Placeholders {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("placeholders.biodiversity", self.biodiversity),
            ("placeholders.energy_flow", self.energy_flow),
            ("placeholders.migration_impact", self.migration_impact),
        ];
        for (key, value) in fields {
            if !value.is_finite() {
                return Err(EeiError::ConfigInvalid {
                    key: key.to_string(),
                    reason: format!("{value} is not a finite number"),
                });
            }
        }
        Ok(())
    }
}

/// EEI for one salinity value
pub fn eei_value(salinity: f64, placeholders: &Placeholders) -> f64 {
    placeholders.biodiversity
        + salinity * SALINITY_WEIGHT
        + placeholders.biodiversity * BIODIVERSITY_WEIGHT
        + placeholders.energy_flow * ENERGY_FLOW_WEIGHT
}

/// EEI over a salinity raster; placeholders broadcast as constant rasters
pub fn eei_raster(salinity: &RasterHandle, placeholders: &Placeholders) -> RasterHandle {
    let biodiversity = RasterHandle::constant(placeholders.biodiversity);
    let energy_flow = RasterHandle::constant(placeholders.energy_flow);

    biodiversity
        .add(&salinity.multiply(SALINITY_WEIGHT))
        .add(&biodiversity.multiply(BIODIVERSITY_WEIGHT))
        .add(&energy_flow.multiply(ENERGY_FLOW_WEIGHT))
}
