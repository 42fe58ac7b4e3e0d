// src/analysis/cusum.rs
use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOW: usize = 10;
pub const DEFAULT_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cusum {
    /// Samples in the trailing mean, current sample included
    #[serde(default = "default_window")]
    pub window: usize,
    /// Slack subtracted at every step
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_window() -> usize {
    DEFAULT_WINDOW
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

impl Default for Cusum {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Two-sided cumulative sums of deviations from a trailing mean.
///
/// Returns `(upper, lower)`, each as long as `data`. The first entry is
/// always 0, and so is every step before the window has filled.
pub fn cusum(data: &[f64], params: Cusum) -> (Vec<f64>, Vec<f64>) {
    let n = data.len();
    let mut upper = vec![0.0; n];
    let mut lower = vec![0.0; n];
    let window = params.window.max(1);

    let mut running = 0.0;
    for i in 0..n {
        running += data[i];
        if i >= window {
            running -= data[i - window];
        }
        if i == 0 || i + 1 < window {
            continue;
        }

        let mean = running / window as f64;
        upper[i] = (upper[i - 1] + data[i] - mean - params.threshold).max(0.0);
        lower[i] = (lower[i - 1] + mean - data[i] - params.threshold).max(0.0);
    }
    (upper, lower)
}
