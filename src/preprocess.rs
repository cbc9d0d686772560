//! Preprocessing adapter
//!
//! Aligns an arbitrary input table to the columns a scaler was fitted on,
//! applies the scaler transform, and reshapes for sequence/convolutional
//! models that expect a rows x features x 1 tensor.

use ndarray::{Array2, Array3, Axis};

use crate::registry::Scaler;
use crate::table::FeatureTable;

/// Architecture tags whose models take 3-D input.
const SEQUENCE_TAGS: [&str; 3] = ["hybrid", "cnn", "bilstm"];

/// Scaled model input, 2-D for classical estimators and dense networks,
/// 3-D for sequence/convolutional architectures.
#[derive(Debug, Clone)]
pub enum ScaledInput {
    Flat(Array2<f32>),
    Seq(Array3<f32>),
}

impl ScaledInput {
    pub fn n_rows(&self) -> usize {
        match self {
            ScaledInput::Flat(data) => data.nrows(),
            ScaledInput::Seq(data) => data.dim().0,
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            ScaledInput::Flat(data) => data.ncols(),
            ScaledInput::Seq(data) => data.dim().1,
        }
    }
}

/// Whether `mode` names a sequence/convolutional architecture.
pub fn needs_sequence_shape(mode: &str) -> bool {
    SEQUENCE_TAGS.iter().any(|tag| mode.contains(tag))
}

/// Align `table` to the scaler's expected columns, scale, and reshape
/// according to `mode` (typically the model key).
///
/// When the scaler carries a feature-name list, the output has exactly those
/// columns in that order, with 0.0 substituted for columns missing from the
/// input. Without a feature-name list the table's numeric columns pass
/// through unchanged (a zero-width matrix with the right row count if there
/// are none).
pub fn preprocess(table: &FeatureTable, scaler: &Scaler, mode: &str) -> ScaledInput {
    let n_rows = table.n_rows();

    let mut aligned = match &scaler.feature_names {
        Some(expected) => {
            let mut data = Array2::<f32>::zeros((n_rows, expected.len()));
            for (col_idx, name) in expected.iter().enumerate() {
                if let Some(values) = table.column(name) {
                    for (row_idx, &v) in values.iter().enumerate() {
                        data[[row_idx, col_idx]] = v;
                    }
                }
            }
            data
        }
        None => {
            let mut data = Array2::<f32>::zeros((n_rows, table.n_columns()));
            for (col_idx, (_, values)) in table.columns().enumerate() {
                for (row_idx, &v) in values.iter().enumerate() {
                    data[[row_idx, col_idx]] = v;
                }
            }
            data
        }
    };

    scaler.transform(&mut aligned);

    if needs_sequence_shape(mode) {
        ScaledInput::Seq(aligned.insert_axis(Axis(2)))
    } else {
        ScaledInput::Flat(aligned)
    }
}
