// src/ui/chart.rs
use chrono::{Datelike, NaiveDate};
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::collection::CollectionQuery;
use crate::error::Result;
use crate::geometry::Region;
use crate::lazy::EvalContext;
use crate::processing::reduce::{reduce_region, Reducer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartOptions {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_h_axis")]
    pub h_axis: String,
    #[serde(default = "default_v_axis")]
    pub v_axis: String,
}

fn default_title() -> String {
    "Salinity Trend (NDWI Proxy, 1990–2024)".to_string()
}

fn default_h_axis() -> String {
    "Year".to_string()
}

fn default_v_axis() -> String {
    "NDWI".to_string()
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: default_title(),
            h_axis: default_h_axis(),
            v_axis: default_v_axis(),
        }
    }
}

/// One point per scene, or one per calendar year
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesAggregation {
    #[default]
    Scene,
    Yearly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    /// `None` when the scene has no valid pixel inside the region
    pub value: Option<f64>,
}

/// Time series of a band's region statistic across a collection
#[derive(Debug, Clone)]
pub struct Chart {
    query: CollectionQuery,
    band: String,
    region: Region,
    reducer: Reducer,
    scale: f64,
    options: ChartOptions,
    aggregation: SeriesAggregation,
}

impl Chart {
    pub fn image_series(
        query: CollectionQuery,
        band: &str,
        region: &Region,
        reducer: Reducer,
        scale: f64,
    ) -> Self {
        Self {
            query,
            band: band.to_string(),
            region: region.clone(),
            reducer,
            scale,
            options: ChartOptions::default(),
            aggregation: SeriesAggregation::default(),
        }
    }

    pub fn with_options(mut self, options: ChartOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_aggregation(mut self, aggregation: SeriesAggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    pub fn band(&self) -> &str {
        &self.band
    }

    pub fn reducer(&self) -> Reducer {
        self.reducer
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn aggregation(&self) -> SeriesAggregation {
        self.aggregation
    }

    /// Force the collection and reduce every image over the region, sorted by date
    pub fn series(&self, ctx: &EvalContext<'_>) -> Result<Vec<SeriesPoint>> {
        let collection = self.query.evaluate(ctx)?;

        let mut points = collection
            .images()
            .par_iter()
            .map(|image| -> Result<SeriesPoint> {
                let raster = image.band(&self.band)?;
                Ok(SeriesPoint {
                    date: image.date(),
                    value: reduce_region(raster, &self.region, self.reducer, self.scale),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        points.sort_by_key(|point| point.date);

        info!(
            points = points.len(),
            aggregation = ?self.aggregation,
            "Built chart series"
        );

        Ok(match self.aggregation {
            SeriesAggregation::Scene => points,
            SeriesAggregation::Yearly => yearly(&points, self.reducer),
        })
    }
}

/// Collapse date-sorted points to one per year, dated January 1st
fn yearly(points: &[SeriesPoint], reducer: Reducer) -> Vec<SeriesPoint> {
    let by_year = points.iter().chunk_by(|point| point.date.year());

    by_year
        .into_iter()
        .filter_map(|(year, group)| {
            let date = NaiveDate::from_ymd_opt(year, 1, 1)?;
            let value = reducer.reduce(group.filter_map(|point| point.value));
            Some(SeriesPoint { date, value })
        })
        .collect()
}
