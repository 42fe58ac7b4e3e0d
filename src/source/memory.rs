// src/source/memory.rs
use std::collections::HashMap;

use crate::collection::{Image, SceneInfo};
use crate::error::{EeiError, Result};

use super::ImageSource;

/// In-memory collections, for tests and demos
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    collections: HashMap<String, Vec<Image>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, id: &str, images: Vec<Image>) -> Self {
        self.collections.insert(id.to_string(), images);
        self
    }
}

impl ImageSource for MemorySource {
    fn scenes(&self, collection: &str) -> Result<Vec<SceneInfo>> {
        self.collections
            .get(collection)
            .map(|images| images.iter().map(|image| image.info().clone()).collect())
            .ok_or_else(|| EeiError::UnknownCollection(collection.to_string()))
    }

    fn load(&self, scene: &SceneInfo) -> Result<Image> {
        self.collections
            .get(&scene.collection)
            .ok_or_else(|| EeiError::UnknownCollection(scene.collection.clone()))?
            .iter()
            .find(|image| image.id() == scene.id)
            .cloned()
            .ok_or_else(|| EeiError::SceneNotFound(scene.id.clone()))
    }
}
