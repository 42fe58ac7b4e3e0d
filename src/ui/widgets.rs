// src/ui/widgets.rs
use serde::{Deserialize, Serialize};

use crate::geometry::Region;
use crate::lazy::RasterHandle;

use super::chart::Chart;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub width: String,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            width: "400px".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub text: String,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Value range and colour ramp of a map layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisParams {
    pub min: f64,
    pub max: f64,
    pub palette: Vec<String>,
}

impl VisParams {
    pub fn new(min: f64, max: f64, palette: &[&str]) -> Self {
        Self {
            min,
            max,
            palette: palette.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    pub vis: VisParams,
    pub handle: RasterHandle,
}

#[derive(Debug, Clone, Default)]
pub struct MapView {
    center: Option<(f64, f64)>,
    zoom: Option<u8>,
    layers: Vec<Layer>,
}

impl MapView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Centre on the region's centroid at the given zoom
    pub fn center_object(&mut self, region: &Region, zoom: u8) {
        self.center = region.centroid();
        self.zoom = Some(zoom);
    }

    pub fn add_layer(&mut self, handle: RasterHandle, vis: VisParams, name: &str) {
        self.layers.push(Layer {
            name: name.to_string(),
            vis,
            handle,
        });
    }

    pub fn center(&self) -> Option<(f64, f64)> {
        self.center
    }

    pub fn zoom(&self) -> Option<u8> {
        self.zoom
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }
}

#[derive(Debug, Clone)]
pub enum Widget {
    Label(Label),
    Chart(Chart),
    Map(MapView),
}

impl Widget {
    pub fn kind(&self) -> &'static str {
        match self {
            Widget::Label(_) => "label",
            Widget::Chart(_) => "chart",
            Widget::Map(_) => "map",
        }
    }
}

impl From<Label> for Widget {
    fn from(label: Label) -> Self {
        Widget::Label(label)
    }
}

impl From<Chart> for Widget {
    fn from(chart: Chart) -> Self {
        Widget::Chart(chart)
    }
}

impl From<MapView> for Widget {
    fn from(map: MapView) -> Self {
        Widget::Map(map)
    }
}

/// Vertical container; widgets render in insertion order
#[derive(Debug, Clone, Default)]
pub struct Panel {
    style: Style,
    widgets: Vec<Widget>,
}

impl Panel {
    pub fn new(style: Style) -> Self {
        Self {
            style,
            widgets: Vec::new(),
        }
    }

    pub fn add(&mut self, widget: impl Into<Widget>) {
        self.widgets.push(widget.into());
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }
}
