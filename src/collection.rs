// src/collection.rs
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use geo::{Point, Rect};
use tracing::{debug, info};

use crate::dates::DateRange;
use crate::error::{EeiError, Result};
use crate::geometry::footprint_touches;
use crate::lazy::EvalContext;
use crate::processing::parallel::IndexCalculator;
use crate::raster::Raster;

/// Scene metadata, known without reading any pixels
#[derive(Debug, Clone, PartialEq)]
pub struct SceneInfo {
    pub id: String,
    pub collection: String,
    pub date: NaiveDate,
    pub footprint: Rect<f64>,
    pub bands: Vec<String>,
}

/// A scene with its bands loaded, in band order
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    info: SceneInfo,
    bands: Vec<(String, Raster)>,
}

impl Image {
    pub fn new(info: SceneInfo, bands: Vec<(String, Raster)>) -> Self {
        Self { info, bands }
    }

    pub fn info(&self) -> &SceneInfo {
        &self.info
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn date(&self) -> NaiveDate {
        self.info.date
    }

    pub fn band_names(&self) -> impl Iterator<Item = &str> {
        self.bands.iter().map(|(name, _)| name.as_str())
    }

    pub fn band(&self, name: &str) -> Result<&Raster> {
        self.bands
            .iter()
            .find(|(band, _)| band == name)
            .map(|(_, raster)| raster)
            .ok_or_else(|| EeiError::MissingBand {
                image: self.info.id.clone(),
                band: name.to_string(),
            })
    }

    /// Append a band, replacing any band of the same name
    pub fn add_band(mut self, name: &str, raster: Raster) -> Self {
        self.bands.retain(|(band, _)| band != name);
        self.bands.push((name.to_string(), raster));
        if !self.info.bands.iter().any(|b| b == name) {
            self.info.bands.push(name.to_string());
        }
        self
    }

    /// Keep only the named bands, in the requested order
    pub fn select(mut self, names: &[String]) -> Result<Self> {
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let index = self
                .bands
                .iter()
                .position(|(band, _)| band == name)
                .ok_or_else(|| EeiError::MissingBand {
                    image: self.info.id.clone(),
                    band: name.clone(),
                })?;
            selected.push(self.bands.swap_remove(index));
        }
        self.info.bands = names.to_vec();
        self.bands = selected;
        Ok(self)
    }
}

/// Materialized result of a [`CollectionQuery`]
#[derive(Debug, Clone, Default)]
pub struct ImageCollection {
    images: Vec<Image>,
}

impl ImageCollection {
    pub fn new(images: Vec<Image>) -> Self {
        Self { images }
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Rasters of one band across the collection, in collection order
    pub fn band_series(&self, band: &str) -> Result<Vec<&Raster>> {
        self.images.iter().map(|image| image.band(band)).collect()
    }
}

impl IntoIterator for ImageCollection {
    type Item = Image;
    type IntoIter = std::vec::IntoIter<Image>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.into_iter()
    }
}

#[derive(Clone)]
enum Node {
    Source(String),
    FilterBounds(Box<Node>, Point<f64>),
    FilterDate(Box<Node>, DateRange),
    Merge(Box<Node>, Box<Node>),
    Map(Box<Node>, Arc<dyn IndexCalculator>),
    Select(Box<Node>, Vec<String>),
}

#[derive(Clone)]
enum PixelOp {
    Map(Arc<dyn IndexCalculator>),
    Select(Vec<String>),
}

/// Deferred description of an image collection.
///
/// Building a query never touches the source. Filters resolve against scene
/// metadata, band math runs after scenes are loaded, and nothing is cached:
/// every call to [`CollectionQuery::evaluate`] goes back to the source.
#[derive(Clone)]
pub struct CollectionQuery {
    root: Node,
}

impl CollectionQuery {
    pub fn new(collection: &str) -> Self {
        Self {
            root: Node::Source(collection.to_string()),
        }
    }

    pub fn filter_bounds(self, point: Point<f64>) -> Self {
        Self {
            root: Node::FilterBounds(Box::new(self.root), point),
        }
    }

    pub fn filter_date(self, range: DateRange) -> Self {
        Self {
            root: Node::FilterDate(Box::new(self.root), range),
        }
    }

    pub fn merge(self, other: CollectionQuery) -> Self {
        Self {
            root: Node::Merge(Box::new(self.root), Box::new(other.root)),
        }
    }

    /// Append the calculator's output band to every image
    pub fn map(self, calculator: Arc<dyn IndexCalculator>) -> Self {
        Self {
            root: Node::Map(Box::new(self.root), calculator),
        }
    }

    pub fn select(self, band: &str) -> Self {
        Self {
            root: Node::Select(Box::new(self.root), vec![band.to_string()]),
        }
    }

    /// Scenes the query would load, without loading them
    pub fn scenes(&self, ctx: &EvalContext<'_>) -> Result<Vec<SceneInfo>> {
        Ok(resolve(&self.root, ctx)?
            .into_iter()
            .map(|(info, _)| info)
            .collect())
    }

    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<ImageCollection> {
        let plan = resolve(&self.root, ctx)?;
        info!(scenes = plan.len(), "Evaluating collection query");

        let infos: Vec<SceneInfo> = plan.iter().map(|(info, _)| info.clone()).collect();
        let loaded = ctx.processor().load_scenes(ctx.source(), &infos)?;

        let mut images = Vec::with_capacity(loaded.len());
        for (image, (_, ops)) in loaded.into_iter().zip(plan) {
            images.push(apply_ops(ctx, image, &ops)?);
        }
        Ok(ImageCollection::new(images))
    }
}

impl fmt::Debug for CollectionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn describe(node: &Node) -> String {
            match node {
                Node::Source(id) => format!("ImageCollection({id})"),
                Node::FilterBounds(inner, p) => {
                    format!("{}.filter_bounds({}, {})", describe(inner), p.x(), p.y())
                }
                Node::FilterDate(inner, range) => format!(
                    "{}.filter_date({}, {})",
                    describe(inner),
                    range.start(),
                    range.end()
                ),
                Node::Merge(a, b) => format!("{}.merge({})", describe(a), describe(b)),
                Node::Map(inner, calc) => format!("{}.map({})", describe(inner), calc.name()),
                Node::Select(inner, bands) => {
                    format!("{}.select({})", describe(inner), bands.join(","))
                }
            }
        }
        f.write_str(&describe(&self.root))
    }
}

fn resolve(node: &Node, ctx: &EvalContext<'_>) -> Result<Vec<(SceneInfo, Vec<PixelOp>)>> {
    Ok(match node {
        Node::Source(id) => ctx
            .source()
            .scenes(id)?
            .into_iter()
            .map(|info| (info, Vec::new()))
            .collect(),
        Node::FilterBounds(inner, point) => resolve(inner, ctx)?
            .into_iter()
            .filter(|(info, _)| footprint_touches(&info.footprint, point))
            .collect(),
        Node::FilterDate(inner, range) => resolve(inner, ctx)?
            .into_iter()
            .filter(|(info, _)| range.contains(info.date))
            .collect(),
        Node::Merge(a, b) => {
            let mut merged = resolve(a, ctx)?;
            merged.extend(resolve(b, ctx)?);
            merged
        }
        Node::Map(inner, calculator) => {
            let mut plan = resolve(inner, ctx)?;
            for (_, ops) in &mut plan {
                ops.push(PixelOp::Map(Arc::clone(calculator)));
            }
            plan
        }
        Node::Select(inner, bands) => {
            let mut plan = resolve(inner, ctx)?;
            for (_, ops) in &mut plan {
                ops.push(PixelOp::Select(bands.clone()));
            }
            plan
        }
    })
}

fn apply_ops(ctx: &EvalContext<'_>, mut image: Image, ops: &[PixelOp]) -> Result<Image> {
    for op in ops {
        image = match op {
            PixelOp::Map(calculator) => ctx.processor().apply_index(calculator.as_ref(), image)?,
            PixelOp::Select(bands) => image.select(bands)?,
        };
    }
    debug!(image = image.id(), "Applied pixel operations");
    Ok(image)
}
