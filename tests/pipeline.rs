// tests/pipeline.rs
use chrono::NaiveDate;
use geo::Rect;

use urmia_eei::collection::{Image, SceneInfo};
use urmia_eei::config::DashboardConfig;
use urmia_eei::dashboard::{build_dashboard, eei, salinity, EEI_LAYER, SALINITY_LAYER, TITLE};
use urmia_eei::error::EeiError;
use urmia_eei::io::{read_band, WriteOptions};
use urmia_eei::lazy::{EvalContext, Evaluated};
use urmia_eei::processing::ParallelProcessor;
use urmia_eei::raster::{is_nodata, GeoTransform, Raster};
use urmia_eei::source::MemorySource;
use urmia_eei::ui::{PublishOptions, SeriesAggregation, Widget};

const LANDSAT: &str = "LANDSAT/LC08/C02/T1_L2";
const MODIS: &str = "MODIS/006/MOD09GA";

/// 8x6 grid of 0.1 degree pixels around the region, one pixel of margin on each side
fn transform() -> GeoTransform {
    GeoTransform::new(44.9, 37.9, 0.1, -0.1)
}

fn scene(collection: &str, id: &str, date: (i32, u32, u32), bbox: [f64; 4], b03: f32, b05: f32) -> Image {
    let info = SceneInfo {
        id: id.to_string(),
        collection: collection.to_string(),
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        footprint: Rect::new((bbox[0], bbox[1]), (bbox[2], bbox[3])),
        bands: vec!["sur_refl_b03".to_string(), "sur_refl_b05".to_string()],
    };
    Image::new(
        info,
        vec![
            ("sur_refl_b03".to_string(), Raster::filled((8, 6), b03, transform())),
            ("sur_refl_b05".to_string(), Raster::filled((8, 6), b05, transform())),
        ],
    )
}

const COVERS: [f64; 4] = [44.5, 37.0, 46.0, 38.5];
const ELSEWHERE: [f64; 4] = [50.0, 30.0, 51.0, 31.0];

/// NDWI per kept scene: 0.2 (2019), 0.5 (2020), -0.1 (2021); mean 0.2
fn source() -> MemorySource {
    MemorySource::new()
        .with_collection(
            LANDSAT,
            vec![
                scene(LANDSAT, "L8_2019", (2019, 7, 1), COVERS, 0.6, 0.4),
                // Before the archive window
                scene(LANDSAT, "L5_1989", (1989, 12, 31), COVERS, 0.0, 1.0),
            ],
        )
        .with_collection(
            MODIS,
            vec![
                scene(MODIS, "MOD_2021", (2021, 6, 1), COVERS, 0.45, 0.55),
                scene(MODIS, "MOD_2020", (2020, 6, 1), COVERS, 0.3, 0.1),
                // Footprint misses the point
                scene(MODIS, "MOD_far", (2020, 6, 2), ELSEWHERE, 0.0, 1.0),
            ],
        )
}

fn ctx(source: &MemorySource) -> EvalContext<'_> {
    EvalContext::new(source, ParallelProcessor::new(Some(2)))
}

#[test]
fn salinity_is_clipped_temporal_mean() {
    let source = source();
    let config = DashboardConfig::default();
    let raster = salinity(&config).unwrap().evaluate(&ctx(&source)).unwrap().into_raster().unwrap();

    assert_eq!(raster.shape(), (8, 6));
    // Border pixels have centres outside the region
    assert!(is_nodata(raster.data()[0]));
    assert!(is_nodata(raster.data()[7]));
    assert!(is_nodata(raster.data()[5 * 8 + 3]));
    // Inner 6x4 block
    assert_eq!(raster.valid_count(), 24);
    let inner = raster.data()[8 + 1];
    assert!((inner as f64 - 0.2).abs() < 1e-5);
}

#[test]
fn eei_raster_matches_formula_and_keeps_nodata() {
    let source = source();
    let config = DashboardConfig::default();
    let raster = match eei(&config).unwrap().evaluate(&ctx(&source)).unwrap() {
        Evaluated::Raster(raster) => raster,
        other => panic!("expected raster, got {other:?}"),
    };

    assert!(is_nodata(raster.data()[0]));
    // 1.1 * 1.3 + 0.2 * 0.5 + 2.0
    let value = raster.data()[2 * 8 + 4] as f64;
    assert!((value - 3.53).abs() < 1e-4);
}

#[test]
fn dashboard_tree_order_and_layers() {
    let source = source();
    let config = DashboardConfig::default();
    let dashboard = build_dashboard(&config, &ctx(&source)).unwrap();

    let root = dashboard.root();
    assert_eq!(root.style().width, "400px");
    let kinds: Vec<_> = root.widgets().iter().map(Widget::kind).collect();
    assert_eq!(kinds, ["label", "chart", "label", "label", "map"]);

    let texts: Vec<_> = root
        .widgets()
        .iter()
        .filter_map(|w| match w {
            Widget::Label(label) => Some(label.text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        texts,
        [TITLE, "EEI (2024): 3.53", "Migration Impact on EEI_urban: 0.3"]
    );

    let Widget::Map(map) = &root.widgets()[4] else {
        panic!("last widget is not a map");
    };
    assert_eq!(map.zoom(), Some(10));
    let (lon, lat) = map.center().unwrap();
    assert!((lon - 45.3).abs() < 1e-9 && (lat - 37.6).abs() < 1e-9);

    let layers = map.layers();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0].name, SALINITY_LAYER);
    assert_eq!((layers[0].vis.min, layers[0].vis.max), (-0.5, 0.5));
    assert_eq!(layers[0].vis.palette, ["blue", "white", "red"]);
    assert_eq!(layers[1].name, EEI_LAYER);
    assert_eq!((layers[1].vis.min, layers[1].vis.max), (0.0, 5.0));
    assert_eq!(layers[1].vis.palette, ["green", "yellow", "red"]);
}

#[test]
fn chart_series_is_per_scene_and_sorted() {
    let source = source();
    let config = DashboardConfig::default();
    let dashboard = build_dashboard(&config, &ctx(&source)).unwrap();

    let Widget::Chart(chart) = &dashboard.root().widgets()[1] else {
        panic!("second widget is not a chart");
    };
    assert_eq!(chart.options().title, "Salinity Trend (NDWI Proxy, 1990–2024)");
    assert_eq!(chart.scale(), 30.0);

    let series = chart.series(&ctx(&source)).unwrap();
    let years: Vec<_> = series.iter().map(|p| p.date.format("%Y").to_string()).collect();
    assert_eq!(years, ["2019", "2020", "2021"]);
    let expected = [0.2, 0.5, -0.1];
    for (point, want) in series.iter().zip(expected) {
        assert!((point.value.unwrap() - want).abs() < 1e-5);
    }
}

#[test]
fn yearly_chart_aggregation() {
    let source = MemorySource::new()
        .with_collection(
            LANDSAT,
            vec![
                scene(LANDSAT, "a", (2020, 3, 1), COVERS, 0.3, 0.1),
                scene(LANDSAT, "b", (2020, 9, 1), COVERS, 0.1, 0.1),
            ],
        )
        .with_collection(MODIS, vec![]);
    let mut config = DashboardConfig::default();
    config.chart.aggregation = SeriesAggregation::Yearly;

    let dashboard = build_dashboard(&config, &ctx(&source)).unwrap();
    let Widget::Chart(chart) = &dashboard.root().widgets()[1] else {
        panic!("second widget is not a chart");
    };
    let series = chart.series(&ctx(&source)).unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    assert!((series[0].value.unwrap() - 0.25).abs() < 1e-5);
}

#[test]
fn narrower_date_range_changes_the_mean() {
    let source = source();
    let config = DashboardConfig {
        start_date: "2020-01-01".to_string(),
        end_date: "2020-12-31".to_string(),
        ..DashboardConfig::default()
    };
    let value = salinity(&config).unwrap().sample(&ctx(&source), 45.3, 37.7).unwrap();
    assert!((value.unwrap() - 0.5).abs() < 1e-5);
}

#[test]
fn unknown_collection_fails_when_forced() {
    let source = MemorySource::new().with_collection(MODIS, vec![]);
    let config = DashboardConfig::default();

    // Building the handle is fine; forcing it is not
    let handle = salinity(&config).unwrap();
    match handle.evaluate(&ctx(&source)) {
        Err(EeiError::UnknownCollection(id)) => assert_eq!(id, LANDSAT),
        other => panic!("expected UnknownCollection, got {other:?}"),
    }
}

#[test]
fn empty_selection_is_an_error() {
    let source = MemorySource::new()
        .with_collection(LANDSAT, vec![])
        .with_collection(MODIS, vec![]);
    let result = build_dashboard(&DashboardConfig::default(), &ctx(&source));
    assert!(matches!(result, Err(EeiError::EmptyCollection(_))));
}

#[test]
fn missing_band_is_fatal() {
    let mut image = scene(MODIS, "MOD_2020", (2020, 6, 1), COVERS, 0.3, 0.1);
    image = image.select(&["sur_refl_b03".to_string()]).unwrap();
    let source = MemorySource::new()
        .with_collection(LANDSAT, vec![])
        .with_collection(MODIS, vec![image]);

    let result = salinity(&DashboardConfig::default()).unwrap().evaluate(&ctx(&source));
    assert!(matches!(result, Err(EeiError::MissingBand { .. })));
}

#[test]
fn publish_writes_bundle_and_returns_url() {
    let source = source();
    let config = DashboardConfig::default();
    let ctx = ctx(&source);
    let dashboard = build_dashboard(&config, &ctx).unwrap();
    let out = tempfile::tempdir().unwrap();

    let url = dashboard.publish(&ctx, out.path(), &PublishOptions::default()).unwrap();
    assert!(url.starts_with("file://"));
    assert!(url.ends_with("lake-urmia-eei/index.html"));

    let bundle = out.path().join("lake-urmia-eei");
    for file in [
        "dashboard.json",
        "index.html",
        "chart-1.csv",
        "layer-salinity.png",
        "layer-salinity.tif",
        "layer-eei.png",
        "layer-eei.tif",
    ] {
        assert!(bundle.join(file).is_file(), "missing {file}");
    }

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(bundle.join("dashboard.json")).unwrap()).unwrap();
    let widgets = json["widgets"].as_array().unwrap();
    assert_eq!(widgets.len(), 5);
    assert_eq!(widgets[2]["text"], "EEI (2024): 3.53");
    assert_eq!(widgets[1]["series"].as_array().unwrap().len(), 3);
    assert_eq!(widgets[4]["layers"][0]["name"], "Salinity");
    assert_eq!(widgets[4]["layers"][1]["width"], 8);
    assert_eq!(json["generator"], format!("urmia-eei {}", urmia_eei::VERSION));

    let csv = std::fs::read_to_string(bundle.join("chart-1.csv")).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("date,value"));
    assert!(lines.next().unwrap().starts_with("2019-07-01,0.2"));

    let png = image::open(bundle.join("layer-eei.png")).unwrap().to_rgba8();
    assert_eq!(png.dimensions(), (8, 6));
    // Clipped border is transparent, interior opaque
    assert_eq!(png.get_pixel(0, 0).0[3], 0);
    assert_eq!(png.get_pixel(3, 2).0[3], 255);
}

#[test]
fn publish_uses_base_url() {
    let source = source();
    let ctx = ctx(&source);
    let dashboard = build_dashboard(&DashboardConfig::default(), &ctx).unwrap();
    let out = tempfile::tempdir().unwrap();

    let options = PublishOptions {
        base_url: Some("https://dashboards.example.org/".to_string()),
        ..PublishOptions::default()
    };
    let url = dashboard.publish(&ctx, out.path(), &options).unwrap();
    assert_eq!(url, "https://dashboards.example.org/lake-urmia-eei/index.html");
}

#[test]
fn fixed_point_layers_round_trip_with_default_scale() {
    let source = source();
    let ctx = ctx(&source);
    let dashboard = build_dashboard(&DashboardConfig::default(), &ctx).unwrap();
    let out = tempfile::tempdir().unwrap();

    // Same options the CLI builds for `run --fixed-point`
    let options = PublishOptions {
        write: WriteOptions {
            use_fixed_point: true,
            ..WriteOptions::default()
        },
        ..PublishOptions::default()
    };
    dashboard.publish(&ctx, out.path(), &options).unwrap();
    let bundle = out.path().join("lake-urmia-eei");

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(bundle.join("dashboard.json")).unwrap()).unwrap();
    let layers = json["widgets"][4]["layers"].as_array().unwrap();
    assert_eq!(layers[0]["scale_factor"], 10000);
    // EEI around 3.5 does not fit int16 at 10000
    assert_eq!(layers[1]["scale_factor"], 1000);

    let interior = 2 * 8 + 4;
    for (layer, file, expected) in [(&layers[0], "layer-salinity.tif", 0.2), (&layers[1], "layer-eei.tif", 3.53)] {
        let scale = layer["scale_factor"].as_f64().unwrap();
        let raster = read_band(&bundle.join(file)).unwrap();
        assert!(is_nodata(raster.data()[0]));
        let decoded = raster.data()[interior] as f64 / scale;
        assert!((decoded - expected).abs() < 1.0 / scale, "{file}: {decoded}");
    }
}

#[test]
fn float_layers_carry_no_scale_factor() {
    let source = source();
    let ctx = ctx(&source);
    let dashboard = build_dashboard(&DashboardConfig::default(), &ctx).unwrap();
    let out = tempfile::tempdir().unwrap();

    dashboard.publish(&ctx, out.path(), &PublishOptions::default()).unwrap();
    let json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(out.path().join("lake-urmia-eei/dashboard.json")).unwrap(),
    )
    .unwrap();
    assert!(json["widgets"][4]["layers"][1].get("scale_factor").is_none());
}
