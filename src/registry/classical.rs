//! Classical estimators (decision tree / random forest / boosted trees)
//!
//! Trees trained offline are exported to a JSON artifact so the engine does
//! not depend on the training framework's serialization. A single-tree
//! artifact is a decision tree; multiple trees average their leaf class
//! distributions (random forest style).

use std::path::Path;

use anyhow::Context;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    /// Split feature index; ignored on leaves.
    #[serde(default)]
    pub feature: usize,
    #[serde(default)]
    pub threshold: f32,
    /// Child node indices; absent on leaves.
    #[serde(default)]
    pub left: Option<usize>,
    #[serde(default)]
    pub right: Option<usize>,
    /// Class distribution; present exactly on leaves.
    #[serde(default)]
    pub distribution: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk the tree for one sample. Missing features compare as 0.0.
    /// Bounded by node count so a malformed artifact cannot loop forever.
    fn leaf_distribution(&self, sample: ArrayView1<f32>) -> Option<&[f32]> {
        let mut idx = 0;
        for _ in 0..=self.nodes.len() {
            let node = self.nodes.get(idx)?;
            if let Some(dist) = &node.distribution {
                return Some(dist);
            }
            let value = sample.get(node.feature).copied().unwrap_or(0.0);
            idx = if value <= node.threshold { node.left? } else { node.right? };
        }
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassicalModel {
    pub n_classes: usize,
    pub trees: Vec<DecisionTree>,
    /// Per-feature importances from training, when the estimator exposes them.
    #[serde(default)]
    pub feature_importances: Option<Vec<f32>>,
}

impl ClassicalModel {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading model file {}", path.display()))?;
        let model: ClassicalModel = serde_json::from_str(&raw)
            .with_context(|| format!("parsing model file {}", path.display()))?;
        Ok(model)
    }

    /// Class scores per row, averaged over all trees.
    pub fn predict_proba(&self, data: &Array2<f32>) -> Array2<f32> {
        let mut scores = Array2::<f32>::zeros((data.nrows(), self.n_classes));
        if self.trees.is_empty() {
            return scores;
        }

        for (row_idx, sample) in data.rows().into_iter().enumerate() {
            for tree in &self.trees {
                if let Some(dist) = tree.leaf_distribution(sample) {
                    for (class_idx, &p) in dist.iter().enumerate().take(self.n_classes) {
                        scores[[row_idx, class_idx]] += p;
                    }
                }
            }
        }

        scores.mapv_inplace(|v| v / self.trees.len() as f32);
        scores
    }

    /// Hard labels per row (arg-max of the averaged distribution).
    pub fn predict(&self, data: &Array2<f32>) -> Vec<usize> {
        let scores = self.predict_proba(data);
        scores
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .max_by(|(_, a), (_, b)| a.total_cmp(b))
                    .map(|(idx, _)| idx)
                    .unwrap_or(0)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn stump(feature: usize, threshold: f32) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode {
                    feature,
                    threshold,
                    left: Some(1),
                    right: Some(2),
                    distribution: None,
                },
                TreeNode {
                    feature: 0,
                    threshold: 0.0,
                    left: None,
                    right: None,
                    distribution: Some(vec![1.0, 0.0]),
                },
                TreeNode {
                    feature: 0,
                    threshold: 0.0,
                    left: None,
                    right: None,
                    distribution: Some(vec![0.0, 1.0]),
                },
            ],
        }
    }

    #[test]
    fn test_single_tree_predict() {
        let model = ClassicalModel {
            n_classes: 2,
            trees: vec![stump(0, 50.0)],
            feature_importances: None,
        };

        let labels = model.predict(&array![[10.0], [100.0]]);
        assert_eq!(labels, vec![0, 1]);
    }

    #[test]
    fn test_forest_averages_distributions() {
        // Two stumps disagree on the middle value: 60 is right of the first
        // split and left of the second, so the averaged attack score is 0.5.
        let model = ClassicalModel {
            n_classes: 2,
            trees: vec![stump(0, 50.0), stump(0, 70.0)],
            feature_importances: None,
        };

        let scores = model.predict_proba(&array![[60.0]]);
        assert!((scores[[0, 0]] - 0.5).abs() < 1e-6);
        assert!((scores[[0, 1]] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_empty_forest_scores_zero() {
        let model = ClassicalModel {
            n_classes: 2,
            trees: vec![],
            feature_importances: None,
        };

        let scores = model.predict_proba(&array![[1.0]]);
        assert_eq!(scores, array![[0.0, 0.0]]);
    }

    #[test]
    fn test_malformed_tree_does_not_loop() {
        // Internal node pointing at itself
        let model = ClassicalModel {
            n_classes: 2,
            trees: vec![DecisionTree {
                nodes: vec![TreeNode {
                    feature: 0,
                    threshold: 0.0,
                    left: Some(0),
                    right: Some(0),
                    distribution: None,
                }],
            }],
            feature_importances: None,
        };

        let labels = model.predict(&array![[1.0]]);
        assert_eq!(labels.len(), 1);
    }

    #[test]
    fn test_from_file_round_trip() {
        let model = ClassicalModel {
            n_classes: 2,
            trees: vec![stump(1, 3.5)],
            feature_importances: Some(vec![0.25, 0.75]),
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sdn_dt.json");
        std::fs::write(&path, serde_json::to_string(&model).unwrap()).unwrap();

        let loaded = ClassicalModel::from_file(&path).unwrap();
        assert_eq!(loaded.n_classes, 2);
        assert_eq!(loaded.trees.len(), 1);
        assert_eq!(loaded.feature_importances, Some(vec![0.25, 0.75]));
    }
}
