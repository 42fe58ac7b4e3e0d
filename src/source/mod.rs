// src/source/mod.rs
pub mod catalog;
pub mod memory;

pub use catalog::CatalogSource;
pub use memory::MemorySource;

use crate::collection::{Image, SceneInfo};
use crate::error::Result;

/// Provider of named image collections.
///
/// `scenes` answers from metadata alone; pixels are only read by `load`.
pub trait ImageSource: Send + Sync {
    /// Every scene of a collection, or `UnknownCollection`
    fn scenes(&self, collection: &str) -> Result<Vec<SceneInfo>>;

    /// Read all bands of one scene
    fn load(&self, scene: &SceneInfo) -> Result<Image>;
}
