//! Manual analysis and explanation handlers
//!
//! Both endpoints take an arbitrary JSON object, pick out the six SDN flow
//! features (absent fields default to 0), and always target the SDN hybrid
//! model/scaler pair.

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use super::analyze::{round4, top_class, ATTACK_CLASS, LABEL_ATTACK, LABEL_NORMAL};
use crate::explain::{feature_names, normalize_importances, saliency};
use crate::preprocess::preprocess;
use crate::registry::{DeepModel, ModelEntry};
use crate::table::FeatureTable;
use crate::{AppError, AppResult, AppState};

const MANUAL_FEATURES: [&str; 6] = [
    "pktcount",
    "bytecount",
    "duration",
    "flows",
    "pktpersec",
    "prio",
];

const SDN_SCALER: &str = "sdn";
const SDN_DEEP_MODEL: &str = "sdn_hybrid";
const SDN_CLASSICAL_MODEL: &str = "sdn_dt";

/// Scalar-output decision threshold.
const ATTACK_THRESHOLD: f32 = 0.5;

#[derive(Debug, Serialize)]
pub struct ManualResponse {
    pub prediction: &'static str,
    pub threat_score: f32,
    pub message: &'static str,
}

fn manual_table(payload: &Value) -> AppResult<FeatureTable> {
    let mut row = Vec::with_capacity(MANUAL_FEATURES.len());
    for field in MANUAL_FEATURES {
        row.push((field.to_string(), numeric_field(payload, field)?));
    }
    Ok(FeatureTable::from_row(row))
}

/// Absent fields default to 0; present fields must be numeric (numbers,
/// numeric strings, or booleans), anything else is a request failure.
fn numeric_field(payload: &Value, field: &str) -> AppResult<f32> {
    match payload.get(field) {
        None => Ok(0.0),
        Some(Value::Number(n)) => Ok(n.as_f64().unwrap_or(0.0) as f32),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| {
            AppError::InternalError(format!("field '{field}' is not numeric: '{s}'"))
        }),
        Some(Value::Bool(b)) => Ok(if *b { 1.0 } else { 0.0 }),
        Some(other) => Err(AppError::InternalError(format!(
            "field '{field}' is not numeric: {other}"
        ))),
    }
}

fn sdn_deep_model(state: &AppState) -> AppResult<&DeepModel> {
    match state.registry.model(SDN_DEEP_MODEL) {
        Some(ModelEntry::Deep(model)) => Ok(model),
        Some(ModelEntry::Classical(_)) => Err(AppError::InternalError(format!(
            "model '{SDN_DEEP_MODEL}' is not a deep model"
        ))),
        None => Err(AppError::AssetMissing(SDN_DEEP_MODEL.to_string())),
    }
}

pub async fn analyze_manual(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> AppResult<Json<ManualResponse>> {
    let table = manual_table(&payload)?;
    let scaler = state
        .registry
        .scaler(SDN_SCALER)
        .ok_or_else(|| AppError::AssetMissing(format!("{SDN_SCALER} scaler")))?;
    let model = sdn_deep_model(&state)?;

    let input = preprocess(&table, scaler, SDN_DEEP_MODEL);
    let scores = model.predict(&input)?;

    if scores.nrows() == 0 || scores.ncols() == 0 {
        return Err(AppError::InternalError("model returned no scores".to_string()));
    }

    let (label, score) = if scores.ncols() > 1 {
        // Softmax-like output row
        let (class, score) = top_class(scores.row(0));
        let label = if class == ATTACK_CLASS { LABEL_ATTACK } else { LABEL_NORMAL };
        (label, score)
    } else {
        // Single-scalar output
        let score = scores[[0, 0]];
        let label = if score >= ATTACK_THRESHOLD { LABEL_ATTACK } else { LABEL_NORMAL };
        (label, score)
    };

    Ok(Json(ManualResponse {
        prediction: label,
        threat_score: round4(score),
        message: "Unified manual analysis with SDN Hybrid.",
    }))
}

pub async fn explain_manual(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> AppResult<Json<Value>> {
    let table = manual_table(&payload)?;
    let scaler = state
        .registry
        .scaler(SDN_SCALER)
        .ok_or_else(|| AppError::AssetMissing(format!("{SDN_SCALER} scaler")))?;

    let input = preprocess(&table, scaler, SDN_DEEP_MODEL);

    // Trained importances from the classical model first
    if let Some(ModelEntry::Classical(classical)) = state.registry.model(SDN_CLASSICAL_MODEL) {
        if let Some(importances) = &classical.feature_importances {
            let names = feature_names(scaler, importances.len());
            return Ok(Json(json!({
                "importances": importance_map(&names, &normalize_importances(importances)),
            })));
        }
    }

    // Fallback: saliency of the deep model around this input
    let model = sdn_deep_model(&state)?;
    let grads = saliency(model, &input)?;
    let names = feature_names(scaler, grads.len());

    Ok(Json(json!({
        "importances": importance_map(&names, &normalize_importances(&grads)),
    })))
}

fn importance_map(names: &[String], values: &[f32]) -> serde_json::Map<String, Value> {
    names
        .iter()
        .zip(values)
        .map(|(name, &v)| (name.clone(), json!(v)))
        .collect()
}
