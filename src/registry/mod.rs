//! Asset registry
//!
//! Process-wide mapping from symbolic keys (`sdn_hybrid`, `cicids_rf`, ...)
//! to loaded models and fitted scalers. Built once at startup, then shared
//! read-only behind an `Arc` through `AppState`; no handler mutates it.

pub mod classical;
pub mod deep;
pub mod scaler;

use std::collections::HashMap;
use std::path::Path;

pub use classical::ClassicalModel;
pub use deep::DeepModel;
pub use scaler::Scaler;

/// Fixed `(dataset, model_type)` -> model key naming table.
///
/// The names are irregular on purpose: they follow the artifact files the
/// training side produced (SDN's deep model is the "hybrid", NSL's pair is
/// bilstm/xgboost). Combinations without a shipped artifact (`ton_rf`,
/// `ids2018_rf`, the NSL pair) still resolve here and fail later at registry
/// lookup.
const MODEL_KEYS: &[((&str, &str), &str)] = &[
    (("sdn", "dl"), "sdn_hybrid"),
    (("sdn", "ml"), "sdn_dt"),
    (("nsl", "dl"), "nsl_bilstm"),
    (("nsl", "ml"), "nsl_xgboost"),
    (("cicids", "dl"), "cicids_cnn"),
    (("cicids", "ml"), "cicids_rf"),
    (("ton", "dl"), "ton_cnn"),
    (("ton", "ml"), "ton_rf"),
    (("ids2018", "dl"), "ids2018_cnn"),
    (("ids2018", "ml"), "ids2018_rf"),
];

/// Resolve the model key for a dataset/model-type pair.
pub fn resolve_model_key(dataset: &str, model_type: &str) -> Option<&'static str> {
    MODEL_KEYS
        .iter()
        .find(|((ds, mt), _)| *ds == dataset && *mt == model_type)
        .map(|(_, key)| *key)
}

/// A loaded model: classical tree ensemble or ONNX network.
#[derive(Debug)]
pub enum ModelEntry {
    Classical(ClassicalModel),
    Deep(DeepModel),
}

#[derive(Debug, Default)]
pub struct AssetRegistry {
    models: HashMap<String, ModelEntry>,
    scalers: HashMap<String, Scaler>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the nine NetShield assets from `dir`.
    ///
    /// On the first individual failure the load step aborts with a logged
    /// error and whatever had been loaded so far stays available; requests
    /// for the missing assets fail at lookup. No retry, no lazy reload.
    pub fn load(dir: &Path) -> Self {
        let mut registry = Self::new();
        match registry.load_assets(dir) {
            Ok(()) => tracing::info!(
                "all NetShield assets loaded ({} models, {} scalers)",
                registry.model_count(),
                registry.scaler_count()
            ),
            Err(e) => tracing::error!(
                "asset load aborted ({} models, {} scalers kept): {:#}",
                registry.model_count(),
                registry.scaler_count(),
                e
            ),
        }
        registry
    }

    fn load_assets(&mut self, dir: &Path) -> anyhow::Result<()> {
        // Custom SDN
        self.load_deep("sdn_hybrid", dir, "sdn_hybrid.onnx")?;
        self.load_classical("sdn_dt", dir, "sdn_dt.json")?;
        self.load_scaler("sdn", dir, "sdn_scaler.json")?;

        // CICIDS-2017
        self.load_deep("cicids_cnn", dir, "cicids_2017_cnn.onnx")?;
        self.load_classical("cicids_rf", dir, "cicids_2017_rf.json")?;
        self.load_scaler("cicids", dir, "cicids_scaler.json")?;

        // ToN IoT & IDS 2018
        self.load_deep("ton_cnn", dir, "ton_iot_cnn.onnx")?;
        self.load_deep("ids2018_cnn", dir, "ids_2018_cnn_lstm.onnx")?;
        self.load_scaler("ids2018", dir, "ids_2018_scaler.json")?;

        Ok(())
    }

    fn load_deep(&mut self, key: &str, dir: &Path, file: &str) -> anyhow::Result<()> {
        let model = DeepModel::from_file(&dir.join(file))?;
        tracing::debug!("loaded deep model '{}' from {}", key, file);
        self.insert_model(key, ModelEntry::Deep(model));
        Ok(())
    }

    fn load_classical(&mut self, key: &str, dir: &Path, file: &str) -> anyhow::Result<()> {
        let model = ClassicalModel::from_file(&dir.join(file))?;
        tracing::debug!("loaded classical model '{}' from {}", key, file);
        self.insert_model(key, ModelEntry::Classical(model));
        Ok(())
    }

    fn load_scaler(&mut self, key: &str, dir: &Path, file: &str) -> anyhow::Result<()> {
        let scaler = Scaler::from_file(&dir.join(file))?;
        tracing::debug!("loaded scaler '{}' from {}", key, file);
        self.scalers.insert(key.to_string(), scaler);
        Ok(())
    }

    pub fn insert_model(&mut self, key: &str, entry: ModelEntry) {
        self.models.insert(key.to_string(), entry);
    }

    pub fn add_scaler(&mut self, key: &str, scaler: Scaler) {
        self.scalers.insert(key.to_string(), scaler);
    }

    pub fn model(&self, key: &str) -> Option<&ModelEntry> {
        self.models.get(key)
    }

    pub fn scaler(&self, key: &str) -> Option<&Scaler> {
        self.scalers.get(key)
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn scaler_count(&self) -> usize {
        self.scalers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_key_table() {
        assert_eq!(resolve_model_key("sdn", "dl"), Some("sdn_hybrid"));
        assert_eq!(resolve_model_key("sdn", "ml"), Some("sdn_dt"));
        assert_eq!(resolve_model_key("nsl", "dl"), Some("nsl_bilstm"));
        assert_eq!(resolve_model_key("nsl", "ml"), Some("nsl_xgboost"));
        assert_eq!(resolve_model_key("cicids", "dl"), Some("cicids_cnn"));
        assert_eq!(resolve_model_key("cicids", "ml"), Some("cicids_rf"));
        assert_eq!(resolve_model_key("ton", "dl"), Some("ton_cnn"));
        assert_eq!(resolve_model_key("ton", "ml"), Some("ton_rf"));
        assert_eq!(resolve_model_key("ids2018", "dl"), Some("ids2018_cnn"));
        assert_eq!(resolve_model_key("ids2018", "ml"), Some("ids2018_rf"));
    }

    #[test]
    fn test_model_key_unknown() {
        assert_eq!(resolve_model_key("sdn", "quantum"), None);
        assert_eq!(resolve_model_key("kdd99", "dl"), None);
    }

    #[test]
    fn test_load_aborts_on_first_failure() {
        // Empty directory: the very first asset fails, nothing is kept
        let dir = tempfile::tempdir().unwrap();
        let registry = AssetRegistry::load(dir.path());

        assert_eq!(registry.model_count(), 0);
        assert_eq!(registry.scaler_count(), 0);
        assert!(registry.model("sdn_hybrid").is_none());
    }

    #[test]
    fn test_lookup_after_manual_insert() {
        let mut registry = AssetRegistry::new();
        registry.add_scaler(
            "sdn",
            Scaler {
                feature_names: None,
                mean: vec![],
                scale: vec![],
            },
        );

        assert!(registry.scaler("sdn").is_some());
        assert!(registry.scaler("cicids").is_none());
    }
}
