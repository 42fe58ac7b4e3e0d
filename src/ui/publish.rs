// src/ui/publish.rs
//! Writing a dashboard out as a static bundle.
//!
//! Publishing is the last forcing point of the pipeline: the chart series is
//! reduced, every map layer is evaluated and rendered, and the bundle lands
//! in `<out_dir>/<dashboard-id>/`:
//!
//! ```text
//! dashboard.json        widget tree with resolved values
//! index.html            page tying the pieces together
//! chart-<n>.csv         date,value per chart
//! layer-<name>.png      palette preview per layer
//! layer-<name>.tif      GeoTIFF per layer
//! ```

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{EeiError, Result};
use crate::io::{write_raster, WriteOptions};
use crate::lazy::{EvalContext, Evaluated};
use crate::processing::reduce::Reducer;
use crate::raster::{GeoTransform, Raster};

use super::chart::{Chart, ChartOptions, SeriesAggregation, SeriesPoint};
use super::palette::raster_to_rgba;
use super::widgets::{Layer, MapView, VisParams, Widget};
use super::Dashboard;
use crate::utils::fixed_point::fit_scale_factor;
use crate::VERSION;

pub const DASHBOARD_FILE: &str = "dashboard.json";
pub const INDEX_FILE: &str = "index.html";

#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// When set, the returned URL is `<base_url>/<id>/index.html`
    pub base_url: Option<String>,
    /// Encoding of the per-layer GeoTIFFs
    pub write: WriteOptions,
}

#[derive(Debug, Serialize)]
struct DashboardDoc<'a> {
    generator: String,
    id: &'a str,
    width: &'a str,
    widgets: Vec<WidgetDoc<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WidgetDoc<'a> {
    Label {
        text: &'a str,
    },
    Chart {
        options: &'a ChartOptions,
        band: &'a str,
        reducer: Reducer,
        scale: f64,
        aggregation: SeriesAggregation,
        csv: String,
        series: Vec<SeriesPoint>,
    },
    Map {
        center: Option<(f64, f64)>,
        zoom: Option<u8>,
        layers: Vec<LayerDoc<'a>>,
    },
}

#[derive(Debug, Serialize)]
struct LayerDoc<'a> {
    name: &'a str,
    vis: &'a VisParams,
    png: String,
    tiff: String,
    width: usize,
    height: usize,
    /// Fixed-point GeoTIFF pixels decode as `stored / scale_factor`
    #[serde(skip_serializing_if = "Option::is_none")]
    scale_factor: Option<i32>,
}

impl Dashboard {
    /// Force every widget, write the bundle and return its URL
    pub fn publish(
        &self,
        ctx: &EvalContext<'_>,
        out_dir: &Path,
        options: &PublishOptions,
    ) -> Result<String> {
        let bundle_dir = out_dir.join(self.id());
        fs::create_dir_all(&bundle_dir)?;
        info!(dir = %bundle_dir.display(), "Publishing dashboard");

        let mut widgets = Vec::with_capacity(self.root().widgets().len());
        let mut charts = 0;
        for widget in self.root().widgets() {
            let doc = match widget {
                Widget::Label(label) => WidgetDoc::Label { text: &label.text },
                Widget::Chart(chart) => {
                    charts += 1;
                    publish_chart(chart, charts, ctx, &bundle_dir)?
                }
                Widget::Map(map) => publish_map(map, ctx, &bundle_dir, &options.write)?,
            };
            widgets.push(doc);
        }

        let doc = DashboardDoc {
            generator: format!("urmia-eei {VERSION}"),
            id: self.id(),
            width: &self.root().style().width,
            widgets,
        };
        fs::write(bundle_dir.join(DASHBOARD_FILE), serde_json::to_string_pretty(&doc)?)?;

        let index_path = bundle_dir.join(INDEX_FILE);
        fs::write(&index_path, render_html(&doc))?;

        let url = match &options.base_url {
            Some(base) => format!("{}/{}/{}", base.trim_end_matches('/'), self.id(), INDEX_FILE),
            None => file_url(&index_path)?,
        };
        info!(%url, "Dashboard published");
        Ok(url)
    }
}

fn publish_chart<'a>(
    chart: &'a Chart,
    number: usize,
    ctx: &EvalContext<'_>,
    dir: &Path,
) -> Result<WidgetDoc<'a>> {
    let series = chart.series(ctx)?;
    let csv_name = format!("chart-{number}.csv");

    let mut writer = csv::Writer::from_path(dir.join(&csv_name))?;
    writer.write_record(["date", "value"])?;
    for point in &series {
        let value = point.value.map(|v| v.to_string()).unwrap_or_default();
        writer.write_record([point.date.to_string(), value])?;
    }
    writer.flush()?;
    debug!(file = %csv_name, points = series.len(), "Wrote chart series");

    Ok(WidgetDoc::Chart {
        options: chart.options(),
        band: chart.band(),
        reducer: chart.reducer(),
        scale: chart.scale(),
        aggregation: chart.aggregation(),
        csv: csv_name,
        series,
    })
}

fn publish_map<'a>(
    map: &'a MapView,
    ctx: &EvalContext<'_>,
    dir: &Path,
    write: &WriteOptions,
) -> Result<WidgetDoc<'a>> {
    let layers = map
        .layers()
        .iter()
        .map(|layer| publish_layer(layer, ctx, dir, write))
        .collect::<Result<Vec<_>>>()?;

    Ok(WidgetDoc::Map {
        center: map.center(),
        zoom: map.zoom(),
        layers,
    })
}

fn publish_layer<'a>(
    layer: &'a Layer,
    ctx: &EvalContext<'_>,
    dir: &Path,
    write: &WriteOptions,
) -> Result<LayerDoc<'a>> {
    let raster = match layer.handle.evaluate(ctx)? {
        Evaluated::Raster(raster) => raster,
        // Uniform layer: one pixel carries the value
        Evaluated::Constant(value) => Raster::filled((1, 1), value as f32, GeoTransform::default()),
    };

    let stem = format!("layer-{}", slug(&layer.name));
    let png = format!("{stem}.png");
    let tiff = format!("{stem}.tif");
    let (width, height) = raster.shape();

    let rgba = raster_to_rgba(&raster, &layer.vis)?;
    let preview = RgbaImage::from_raw(width as u32, height as u32, rgba).ok_or_else(|| {
        EeiError::SizeMismatch {
            expected: (width, height),
            actual: (0, 0),
        }
    })?;
    preview.save(dir.join(&png))?;

    // Each layer gets the largest scale its value range allows
    let scale_factor = write
        .use_fixed_point
        .then(|| fit_scale_factor(raster.data(), write.scale_factor));
    let write = WriteOptions {
        description: layer.name.clone(),
        scale_factor: scale_factor.unwrap_or(write.scale_factor),
        ..write.clone()
    };
    write_raster(&raster, &dir.join(&tiff), &write)?;
    debug!(layer = %layer.name, width, height, ?scale_factor, "Rendered layer");

    Ok(LayerDoc {
        name: &layer.name,
        vis: &layer.vis,
        png,
        tiff,
        width,
        height,
        scale_factor,
    })
}

fn slug(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect()
}

fn file_url(path: &Path) -> Result<String> {
    let absolute: PathBuf = fs::canonicalize(path)?;
    Ok(format!("file://{}", encode_path(&absolute.to_string_lossy())))
}

/// Percent-encode everything but RFC 3986 unreserved bytes and `/`
fn encode_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                out.push(byte as char)
            }
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

const SVG_WIDTH: f64 = 360.0;
const SVG_HEIGHT: f64 = 180.0;

/// Line plot of the valid points, in insertion (date) order
fn render_svg(series: &[SeriesPoint]) -> String {
    let values: Vec<(usize, f64)> = series
        .iter()
        .enumerate()
        .filter_map(|(i, point)| point.value.map(|v| (i, v)))
        .collect();
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, v)| (lo.min(v), hi.max(v)));
    let span = if hi - lo > f64::EPSILON { hi - lo } else { 1.0 };
    let steps = series.len().saturating_sub(1).max(1) as f64;

    let points = values
        .iter()
        .map(|&(i, v)| {
            let x = i as f64 / steps * SVG_WIDTH;
            let y = SVG_HEIGHT - (v - lo) / span * SVG_HEIGHT;
            format!("{x:.1},{y:.1}")
        })
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "<svg width=\"{SVG_WIDTH}\" height=\"{SVG_HEIGHT}\" viewBox=\"0 0 {SVG_WIDTH} {SVG_HEIGHT}\">\
         <polyline fill=\"none\" stroke=\"steelblue\" stroke-width=\"1.5\" points=\"{points}\"/></svg>"
    )
}

fn render_html(doc: &DashboardDoc<'_>) -> String {
    let mut body = String::new();
    for widget in &doc.widgets {
        // Writing to a String cannot fail
        let _ = match widget {
            WidgetDoc::Label { text } => writeln!(body, "<p class=\"label\">{}</p>", escape(text)),
            WidgetDoc::Chart {
                options,
                csv,
                series,
                ..
            } => writeln!(
                body,
                "<figure class=\"chart\"><figcaption>{}</figcaption>{}\
                 <div class=\"axes\">x: {} / y: {}</div><a href=\"{}\">data</a></figure>",
                escape(&options.title),
                render_svg(series),
                escape(&options.h_axis),
                escape(&options.v_axis),
                csv
            ),
            WidgetDoc::Map { center, zoom, layers } => {
                let mut map = String::from("<section class=\"map\"");
                if let (Some((lon, lat)), Some(zoom)) = (center, zoom) {
                    let _ = write!(map, " data-center=\"{lon},{lat}\" data-zoom=\"{zoom}\"");
                }
                map.push('>');
                for layer in layers {
                    let _ = write!(
                        map,
                        "<figure class=\"layer\"><img src=\"{}\" alt=\"{name}\">\
                         <figcaption>{name} [{}, {}]</figcaption></figure>",
                        layer.png,
                        layer.vis.min,
                        layer.vis.max,
                        name = escape(layer.name)
                    );
                }
                writeln!(body, "{map}</section>")
            }
        };
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{id}</title>\n\
         <style>main {{ width: {width}; }} .layer img {{ width: 100%; image-rendering: pixelated; }}</style>\n\
         </head>\n<body>\n<main>\n{body}</main>\n</body>\n</html>\n",
        id = escape(doc.id),
        width = escape(doc.width),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn slugs_are_file_safe() {
        assert_eq!(slug("Salinity"), "salinity");
        assert_eq!(slug("EEI 2024/x"), "eei-2024-x");
    }

    #[test]
    fn file_urls_are_percent_encoded() {
        assert_eq!(encode_path("/tmp/my out/#1/ü.html"), "/tmp/my%20out/%231/%C3%BC.html");

        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a b#c");
        fs::create_dir_all(&nested).unwrap();
        let index = nested.join(INDEX_FILE);
        fs::write(&index, "").unwrap();
        let url = file_url(&index).unwrap();
        assert!(url.starts_with("file:///"));
        assert!(url.ends_with("/a%20b%23c/index.html"));
        assert!(!url.contains(' '));
    }

    #[test]
    fn html_is_escaped() {
        assert_eq!(escape("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }

    #[test]
    fn svg_skips_missing_points() {
        let day = |d| NaiveDate::from_ymd_opt(2020, 1, d).unwrap();
        let series = vec![
            SeriesPoint { date: day(1), value: Some(0.0) },
            SeriesPoint { date: day(2), value: None },
            SeriesPoint { date: day(3), value: Some(1.0) },
        ];
        let svg = render_svg(&series);
        assert!(svg.contains("points=\"0.0,180.0 360.0,0.0\""));
    }
}
