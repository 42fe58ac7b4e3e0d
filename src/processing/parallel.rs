// src/processing/parallel.rs
use std::{num::NonZero, thread};

use tracing::debug;

use crate::collection::{Image, SceneInfo};
use crate::error::Result;
use crate::source::ImageSource;

use crate::raster::Raster;

pub struct ParallelProcessor {
    io_threads: usize,
}

impl ParallelProcessor {
    pub fn new(io_threads: Option<usize>) -> Self {
        let io_threads = io_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZero::get)
                .unwrap_or(4)
                .max(4)
        });

        Self {
            io_threads: io_threads.max(1),
        }
    }

    pub fn io_threads(&self) -> usize {
        self.io_threads
    }

    /// Load scenes on the I/O threads, returned in the order requested.
    ///
    /// The first failing scene (in request order) is reported once every
    /// worker has finished.
    pub fn load_scenes(&self, source: &dyn ImageSource, scenes: &[SceneInfo]) -> Result<Vec<Image>> {
        if scenes.is_empty() {
            return Ok(Vec::new());
        }

        let workers = self.io_threads.min(scenes.len());
        let mut slots: Vec<Option<Result<Image>>> = (0..scenes.len()).map(|_| None).collect();

        thread::scope(|scope| {
            let (tx, rx) = flume::unbounded();

            for worker in 0..workers {
                let tx = tx.clone();
                scope.spawn(move || {
                    for idx in (worker..scenes.len()).step_by(workers) {
                        let scene = &scenes[idx];
                        debug!(scene = %scene.id, worker, "Loading scene");
                        if tx.send((idx, source.load(scene))).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(tx);

            for (idx, loaded) in rx {
                slots[idx] = Some(loaded);
            }
        });

        slots
            .into_iter()
            .flatten()
            .collect::<Result<Vec<_>>>()
    }

    /// Run a calculator on one image and append its output band
    pub fn apply_index(&self, calculator: &dyn IndexCalculator, image: Image) -> Result<Image> {
        let inputs = calculator
            .required_bands()
            .iter()
            .map(|band| image.band(band))
            .collect::<Result<Vec<_>>>()?;

        let output = calculator.calculate(&inputs)?;
        debug!(image = image.id(), index = calculator.name(), "Calculated index");

        Ok(image.add_band(calculator.name(), output))
    }
}

pub trait IndexCalculator: Send + Sync {
    /// Calculate the index from the input bands, given in `required_bands` order
    fn calculate(&self, inputs: &[&Raster]) -> Result<Raster>;

    /// Names of the bands the calculator reads
    fn required_bands(&self) -> &[String];

    /// Name of the output band
    fn name(&self) -> &str;
}
