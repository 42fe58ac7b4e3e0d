// src/source/catalog.rs
//! Directory-backed scene catalog.
//!
//! A catalog directory holds `catalog.json` plus single-band GeoTIFFs:
//!
//! ```json
//! {
//!   "collections": {
//!     "MODIS/006/MOD09GA": [
//!       {
//!         "id": "MOD09GA_2020_06_01",
//!         "date": "2020-06-01",
//!         "bbox": [44.5, 37.0, 46.0, 38.5],
//!         "bands": {
//!           "sur_refl_b03": "modis/2020_06_01_b03.tif",
//!           "sur_refl_b05": "modis/2020_06_01_b05.tif"
//!         }
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! Band paths are relative to the catalog directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use geo::Rect;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::collection::{Image, SceneInfo};
use crate::error::{EeiError, Result};
use crate::io::read_band;
use crate::raster::Raster;

use super::ImageSource;

pub const CATALOG_FILE: &str = "catalog.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub collections: BTreeMap<String, Vec<SceneEntry>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneEntry {
    pub id: String,
    pub date: NaiveDate,
    /// `[min_x, min_y, max_x, max_y]`
    pub bbox: [f64; 4],
    pub bands: BTreeMap<String, PathBuf>,
}

impl SceneEntry {
    fn info(&self, collection: &str) -> SceneInfo {
        let [min_x, min_y, max_x, max_y] = self.bbox;
        SceneInfo {
            id: self.id.clone(),
            collection: collection.to_string(),
            date: self.date,
            footprint: Rect::new((min_x, min_y), (max_x, max_y)),
            bands: self.bands.keys().cloned().collect(),
        }
    }
}

pub struct CatalogSource {
    root: PathBuf,
    catalog: CatalogFile,
}

impl CatalogSource {
    /// Load `catalog.json` from a catalog directory
    pub fn open(root: &Path) -> Result<Self> {
        let content = fs::read_to_string(root.join(CATALOG_FILE))?;
        let catalog: CatalogFile = serde_json::from_str(&content)?;

        info!(
            root = %root.display(),
            collections = catalog.collections.len(),
            "Loaded scene catalog"
        );

        Ok(Self {
            root: root.to_path_buf(),
            catalog,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry(&self, scene: &SceneInfo) -> Result<&SceneEntry> {
        self.catalog
            .collections
            .get(&scene.collection)
            .ok_or_else(|| EeiError::UnknownCollection(scene.collection.clone()))?
            .iter()
            .find(|entry| entry.id == scene.id)
            .ok_or_else(|| EeiError::SceneNotFound(scene.id.clone()))
    }
}

impl ImageSource for CatalogSource {
    fn scenes(&self, collection: &str) -> Result<Vec<SceneInfo>> {
        let entries = self
            .catalog
            .collections
            .get(collection)
            .ok_or_else(|| EeiError::UnknownCollection(collection.to_string()))?;
        Ok(entries.iter().map(|entry| entry.info(collection)).collect())
    }

    fn load(&self, scene: &SceneInfo) -> Result<Image> {
        let entry = self.entry(scene)?;

        let mut bands: Vec<(String, Raster)> = Vec::with_capacity(entry.bands.len());
        for (name, relative) in &entry.bands {
            let path = self.root.join(relative);
            debug!(scene = %entry.id, band = %name, path = %path.display(), "Reading band");
            let raster = read_band(&path)?;
            if let Some((_, first)) = bands.first() {
                first.ensure_same_shape(&raster)?;
            }
            bands.push((name.clone(), raster));
        }

        Ok(Image::new(entry.info(&scene.collection), bands))
    }
}
