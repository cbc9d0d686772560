//! Feature-importance explanations
//!
//! Two strategies, in preference order: the classical model's trained
//! feature importances, and a numeric saliency fallback for the deep model.
//! ONNX Runtime exposes no gradients, so saliency is a central-difference
//! estimate of the attack channel's sensitivity per input feature.

use anyhow::bail;
use ndarray::Array2;

use crate::preprocess::ScaledInput;
use crate::registry::{DeepModel, Scaler};

const SALIENCY_EPS: f32 = 1e-3;

/// Scale values so their absolute values sum to 1.0. All-zero input stays
/// all-zero instead of dividing by zero.
pub fn normalize_importances(values: &[f32]) -> Vec<f32> {
    let total: f32 = values.iter().map(|v| v.abs()).sum();
    if total == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| v / total).collect()
}

/// Feature names from the scaler, padded with synthetic `f{i}` names when
/// the scaler has no recorded list (or a shorter one).
pub fn feature_names(scaler: &Scaler, count: usize) -> Vec<String> {
    let recorded = scaler.feature_names.as_deref().unwrap_or(&[]);
    (0..count)
        .map(|i| {
            recorded
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("f{i}"))
        })
        .collect()
}

/// Per-feature saliency of the deep model at `input` (single sample):
/// |d target / d x_i| estimated by central differences, where the target is
/// the attack output channel (column 1) for multi-output models and the
/// sole output otherwise.
pub fn saliency(model: &DeepModel, input: &ScaledInput) -> anyhow::Result<Vec<f32>> {
    if input.n_rows() == 0 {
        bail!("empty input sample");
    }

    let n_features = input.n_features();
    let mut grads = Vec::with_capacity(n_features);

    for feature in 0..n_features {
        let up = model.predict(&perturbed(input, feature, SALIENCY_EPS))?;
        let down = model.predict(&perturbed(input, feature, -SALIENCY_EPS))?;
        let grad = (target_score(&up) - target_score(&down)) / (2.0 * SALIENCY_EPS);
        grads.push(grad.abs());
    }

    Ok(grads)
}

fn perturbed(input: &ScaledInput, feature: usize, delta: f32) -> ScaledInput {
    match input {
        ScaledInput::Flat(data) => {
            let mut data = data.clone();
            data[[0, feature]] += delta;
            ScaledInput::Flat(data)
        }
        ScaledInput::Seq(data) => {
            let mut data = data.clone();
            data[[0, feature, 0]] += delta;
            ScaledInput::Seq(data)
        }
    }
}

fn target_score(scores: &Array2<f32>) -> f32 {
    if scores.ncols() > 1 {
        scores[[0, 1]]
    } else if scores.ncols() == 1 {
        scores[[0, 0]]
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_normalize_sums_to_one() {
        let normalized = normalize_importances(&[2.0, -1.0, 1.0]);
        let total: f32 = normalized.iter().map(|v| v.abs()).sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!((normalized[0] - 0.5).abs() < 1e-6);
        assert!((normalized[1] + 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_all_zero() {
        assert_eq!(normalize_importances(&[0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
        assert!(normalize_importances(&[]).is_empty());
    }

    #[test]
    fn test_feature_names_from_scaler() {
        let scaler = Scaler {
            feature_names: Some(vec!["pktcount".to_string(), "flows".to_string()]),
            mean: vec![],
            scale: vec![],
        };

        assert_eq!(feature_names(&scaler, 2), vec!["pktcount", "flows"]);
    }

    #[test]
    fn test_feature_names_synthetic_fallback() {
        let scaler = Scaler {
            feature_names: None,
            mean: vec![],
            scale: vec![],
        };

        assert_eq!(feature_names(&scaler, 3), vec!["f0", "f1", "f2"]);
    }

    #[test]
    fn test_feature_names_pads_short_list() {
        let scaler = Scaler {
            feature_names: Some(vec!["pktcount".to_string()]),
            mean: vec![],
            scale: vec![],
        };

        assert_eq!(feature_names(&scaler, 2), vec!["pktcount", "f1"]);
    }

    #[test]
    fn test_saliency_recovers_linear_weights() {
        // Attack channel is a linear map, so central differences recover the
        // weights exactly (up to float noise).
        let model = DeepModel::from_scorer(|input| {
            let (a, b) = match input {
                ScaledInput::Flat(data) => (data[[0, 0]], data[[0, 1]]),
                ScaledInput::Seq(data) => (data[[0, 0, 0]], data[[0, 1, 0]]),
            };
            let attack = 2.0 * a - 1.0 * b;
            array![[1.0 - attack, attack]]
        });

        let input = ScaledInput::Seq(array![[[0.5], [0.25]]]);
        let grads = saliency(&model, &input).unwrap();

        assert_eq!(grads.len(), 2);
        assert!((grads[0] - 2.0).abs() < 1e-2);
        assert!((grads[1] - 1.0).abs() < 1e-2);
    }

    #[test]
    fn test_saliency_rejects_empty_input() {
        let model = DeepModel::from_scorer(|_| array![[0.0, 1.0]]);
        let input = ScaledInput::Flat(ndarray::Array2::zeros((0, 6)));

        assert!(saliency(&model, &input).is_err());
    }

    #[test]
    fn test_target_score_channels() {
        assert_eq!(target_score(&array![[0.2, 0.8]]), 0.8);
        assert_eq!(target_score(&array![[0.7]]), 0.7);
    }

    #[test]
    fn test_perturbed_touches_one_feature() {
        let input = ScaledInput::Flat(array![[1.0, 2.0]]);
        match perturbed(&input, 1, 0.5) {
            ScaledInput::Flat(data) => assert_eq!(data, array![[1.0, 2.5]]),
            ScaledInput::Seq(_) => panic!("shape must be preserved"),
        }
    }
}
