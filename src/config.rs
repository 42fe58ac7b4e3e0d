// src/config.rs
use std::fs;
use std::path::Path;

use geo::Point;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dates::DateRange;
use crate::eei::Placeholders;
use crate::error::{EeiError, Result};
use crate::geometry::{Region, LAKE_URMIA_POINT, LAKE_URMIA_RING};
use crate::ui::palette::Palette;
use crate::ui::{ChartOptions, SeriesAggregation, VisParams};

/// Everything the pipeline reads, with defaults for Lake Urmia
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    #[serde(default = "default_id")]
    pub id: String,
    #[serde(default = "default_collections")]
    pub collections: Vec<String>,
    #[serde(default = "default_point")]
    pub point: [f64; 2],
    #[serde(default = "default_region")]
    pub region: Vec<[f64; 2]>,
    #[serde(default = "default_start_date")]
    pub start_date: String,
    #[serde(default = "default_end_date")]
    pub end_date: String,
    #[serde(default = "default_ndwi_bands")]
    pub ndwi_bands: [String; 2],
    #[serde(default)]
    pub chart: ChartConfig,
    #[serde(default)]
    pub placeholders: Placeholders,
    #[serde(default = "default_salinity_vis")]
    pub salinity_vis: VisParams,
    #[serde(default = "default_eei_vis")]
    pub eei_vis: VisParams,
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    #[serde(default = "default_panel_width")]
    pub panel_width: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub io_threads: Option<usize>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ChartConfig {
    /// Sampling scale in metres
    #[serde(default = "default_chart_scale")]
    pub scale: f64,
    #[serde(default)]
    pub options: ChartOptions,
    #[serde(default)]
    pub aggregation: SeriesAggregation,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            scale: default_chart_scale(),
            options: ChartOptions::default(),
            aggregation: SeriesAggregation::default(),
        }
    }
}

fn default_id() -> String {
    "lake-urmia-eei".to_string()
}

fn default_collections() -> Vec<String> {
    vec![
        "LANDSAT/LC08/C02/T1_L2".to_string(),
        "MODIS/006/MOD09GA".to_string(),
    ]
}

fn default_point() -> [f64; 2] {
    LAKE_URMIA_POINT
}

fn default_region() -> Vec<[f64; 2]> {
    LAKE_URMIA_RING.to_vec()
}

fn default_start_date() -> String {
    "1990-01-01".to_string()
}

fn default_end_date() -> String {
    "2024-12-31".to_string()
}

fn default_ndwi_bands() -> [String; 2] {
    ["sur_refl_b03".to_string(), "sur_refl_b05".to_string()]
}

fn default_chart_scale() -> f64 {
    30.0
}

fn default_salinity_vis() -> VisParams {
    VisParams::new(-0.5, 0.5, &["blue", "white", "red"])
}

fn default_eei_vis() -> VisParams {
    VisParams::new(0.0, 5.0, &["green", "yellow", "red"])
}

fn default_zoom() -> u8 {
    10
}

fn default_panel_width() -> String {
    "400px".to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            id: default_id(),
            collections: default_collections(),
            point: default_point(),
            region: default_region(),
            start_date: default_start_date(),
            end_date: default_end_date(),
            ndwi_bands: default_ndwi_bands(),
            chart: ChartConfig::default(),
            placeholders: Placeholders::default(),
            salinity_vis: default_salinity_vis(),
            eei_vis: default_eei_vis(),
            zoom: default_zoom(),
            panel_width: default_panel_width(),
            base_url: None,
            io_threads: None,
        }
    }
}

impl DashboardConfig {
    /// Read a JSON config and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: DashboardConfig = serde_json::from_str(&content)?;
        config.validate()?;
        info!(path = %path.display(), id = %config.id, "Loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, reason: String| EeiError::ConfigInvalid {
            key: key.to_string(),
            reason,
        };

        if self.id.is_empty() || self.id.contains(['/', '\\']) {
            return Err(invalid("id", format!("{:?} is not a usable directory name", self.id)));
        }
        if self.collections.is_empty() {
            return Err(invalid("collections", "at least one collection is required".to_string()));
        }
        if self.point.iter().any(|v| !v.is_finite()) {
            return Err(invalid("point", "coordinates must be finite".to_string()));
        }
        if self.ndwi_bands[0] == self.ndwi_bands[1] {
            return Err(invalid("ndwi_bands", "the two bands must differ".to_string()));
        }
        if !(self.chart.scale > 0.0) {
            return Err(invalid("chart.scale", format!("{} must be positive", self.chart.scale)));
        }
        for (key, vis) in [("salinity_vis", &self.salinity_vis), ("eei_vis", &self.eei_vis)] {
            if !(vis.min < vis.max) {
                return Err(invalid(key, format!("min {} must be below max {}", vis.min, vis.max)));
            }
            Palette::from_names(&vis.palette)?;
        }
        if self.io_threads == Some(0) {
            return Err(invalid("io_threads", "must be at least 1".to_string()));
        }

        self.region()?;
        self.date_range()?;
        self.placeholders.validate()
    }

    pub fn region(&self) -> Result<Region> {
        Region::from_vertices(&self.region)
    }

    pub fn date_range(&self) -> Result<DateRange> {
        DateRange::parse(&self.start_date, &self.end_date)
    }

    pub fn point(&self) -> Point<f64> {
        Point::new(self.point[0], self.point[1])
    }
}
