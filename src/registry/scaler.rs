//! Fitted feature scaler
//!
//! Standardization parameters exported from training as JSON:
//!
//! ```json
//! {
//!   "feature_names": ["pktcount", "bytecount", ...],
//!   "mean": [120.4, ...],
//!   "scale": [40.2, ...]
//! }
//! ```
//!
//! `feature_names` is optional; without it the preprocessing adapter passes
//! the input's numeric columns through in their own order.

use std::path::Path;

use anyhow::Context;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

const MIN_SCALE: f32 = 1e-8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    /// Expected feature columns, in training order.
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub mean: Vec<f32>,
    pub scale: Vec<f32>,
}

impl Scaler {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading scaler file {}", path.display()))?;
        let scaler: Scaler = serde_json::from_str(&raw)
            .with_context(|| format!("parsing scaler file {}", path.display()))?;
        Ok(scaler)
    }

    /// Standardize in place, column by column. Columns beyond the fitted
    /// parameter vectors fall back to identity (mean 0, scale 1).
    pub fn transform(&self, data: &mut Array2<f32>) {
        for (col_idx, mut column) in data.columns_mut().into_iter().enumerate() {
            let mean = self.mean.get(col_idx).copied().unwrap_or(0.0);
            let scale = self.scale.get(col_idx).copied().unwrap_or(1.0).max(MIN_SCALE);
            column.mapv_inplace(|v| (v - mean) / scale);
        }
    }
}
