// src/ui/mod.rs
pub mod chart;
pub mod palette;
pub mod publish;
pub mod widgets;

pub use chart::{Chart, ChartOptions, SeriesAggregation, SeriesPoint};
pub use publish::PublishOptions;
pub use widgets::{Label, Layer, MapView, Panel, Style, VisParams, Widget};

/// An assembled dashboard: an id plus its root panel.
///
/// Built once and never mutated; [`Dashboard::publish`] forces its lazy
/// content and writes it out.
#[derive(Debug, Clone)]
pub struct Dashboard {
    id: String,
    root: Panel,
}

impl Dashboard {
    pub fn new(id: &str, root: Panel) -> Self {
        Self {
            id: id.to_string(),
            root,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn root(&self) -> &Panel {
        &self.root
    }
}
