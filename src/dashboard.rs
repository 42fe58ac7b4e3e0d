// src/dashboard.rs
//! The Lake Urmia pipeline, from collection queries to the assembled UI tree.
//!
//! Everything here only builds lazy descriptions. The EEI label is the one
//! exception: it needs a number, so [`build_dashboard`] samples the EEI
//! raster at the point of interest while assembling the panel.

use std::sync::Arc;

use tracing::info;

use crate::collection::CollectionQuery;
use crate::config::DashboardConfig;
use crate::eei::eei_raster;
use crate::error::{EeiError, Result};
use crate::lazy::{EvalContext, RasterHandle};
use crate::processing::indices::NDWI;
use crate::processing::reduce::Reducer;
use crate::ui::{Chart, Dashboard, Label, MapView, Panel, Style};

pub const NDWI_BAND: &str = "NDWI";
pub const TITLE: &str = "EEI Monitoring Dashboard for Lake Urmia";
pub const SALINITY_LAYER: &str = "Salinity";
pub const EEI_LAYER: &str = "EEI";

/// Every configured collection, filtered by the point, merged, then filtered by date
pub fn dataset(config: &DashboardConfig) -> Result<CollectionQuery> {
    let point = config.point();
    let range = config.date_range()?;

    let mut queries = config
        .collections
        .iter()
        .map(|id| CollectionQuery::new(id).filter_bounds(point));
    let first = queries.next().ok_or_else(|| EeiError::ConfigInvalid {
        key: "collections".to_string(),
        reason: "at least one collection is required".to_string(),
    })?;

    Ok(queries.fold(first, CollectionQuery::merge).filter_date(range))
}

/// The dataset with the NDWI band appended to every image
pub fn ndwi_collection(config: &DashboardConfig) -> Result<CollectionQuery> {
    let [first, second] = &config.ndwi_bands;
    let ndwi = NDWI::new(first, second, Some(NDWI_BAND.to_string()));
    Ok(dataset(config)?.map(Arc::new(ndwi)))
}

/// Temporal mean of NDWI clipped to the region
pub fn salinity(config: &DashboardConfig) -> Result<RasterHandle> {
    let query = ndwi_collection(config)?.select(NDWI_BAND);
    Ok(RasterHandle::reduce(query, NDWI_BAND, Reducer::Mean).clip(&config.region()?))
}

pub fn eei(config: &DashboardConfig) -> Result<RasterHandle> {
    Ok(eei_raster(&salinity(config)?, &config.placeholders))
}

/// Text of the EEI readout; `n/a` when the point falls on NoData
pub fn format_eei(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("EEI (2024): {v:.2}"),
        None => "EEI (2024): n/a".to_string(),
    }
}

/// Assemble the panel: title, chart, EEI readout, migration readout, map
pub fn build_dashboard(config: &DashboardConfig, ctx: &EvalContext<'_>) -> Result<Dashboard> {
    config.validate()?;
    let region = config.region()?;
    let salinity = salinity(config)?;
    let eei = eei_raster(&salinity, &config.placeholders);

    let mut panel = Panel::new(Style {
        width: config.panel_width.clone(),
    });
    panel.add(Label::new(TITLE));

    let chart = Chart::image_series(
        ndwi_collection(config)?,
        NDWI_BAND,
        &region,
        Reducer::Mean,
        config.chart.scale,
    )
    .with_options(config.chart.options.clone())
    .with_aggregation(config.chart.aggregation);
    panel.add(chart);

    let [x, y] = config.point;
    let eei_at_point = eei.sample(ctx, x, y)?;
    info!(value = ?eei_at_point, "Sampled EEI at point of interest");
    panel.add(Label::new(format_eei(eei_at_point)));

    panel.add(Label::new(format!(
        "Migration Impact on EEI_urban: {}",
        config.placeholders.migration_impact
    )));

    let mut map = MapView::new();
    map.center_object(&region, config.zoom);
    map.add_layer(salinity, config.salinity_vis.clone(), SALINITY_LAYER);
    map.add_layer(eei, config.eei_vis.clone(), EEI_LAYER);
    panel.add(map);

    Ok(Dashboard::new(&config.id, panel))
}
