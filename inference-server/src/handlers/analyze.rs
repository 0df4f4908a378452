//! Rule analysis handlers
//!
//! Rules always run. The model view is added when the loaded model was
//! trained on the matching theme, so an `iam` model scores policies and a
//! `flows` model scores flow batches.

use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;
use serde_json::Value;

use sentinel_core::logic::pipeline::PredictionSummary;
use sentinel_core::logic::rules::{analyze_flows, PolicyAnalysis, RuleReport};
use sentinel_core::{Prediction, RawRecord, Theme};

use super::predict::parse_json;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

const DEFAULT_POLICY_NAME: &str = "policy";

#[derive(Serialize)]
pub struct PolicyResponse {
    #[serde(flatten)]
    analysis: PolicyAnalysis,
    /// None unless an `iam` model is loaded
    prediction: Option<Prediction>,
}

#[derive(Serialize)]
pub struct FlowsResponse {
    rules: RuleReport,
    /// None unless a `flows` model is loaded
    predictions: Option<Vec<Prediction>>,
    summary: Option<PredictionSummary>,
}

/// Accepts a bare policy document or `{"name": .., "policy": {..}}`
fn split_policy(value: Value) -> (String, Value) {
    match value {
        Value::Object(mut map) if map.get("policy").map_or(false, Value::is_object) => {
            let name = map
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_POLICY_NAME)
                .to_string();
            let policy = map.remove("policy").unwrap_or(Value::Null);
            (name, policy)
        }
        other => (DEFAULT_POLICY_NAME.to_string(), other),
    }
}

pub async fn policy(State(state): State<AppState>, body: Bytes) -> AppResult<Json<PolicyResponse>> {
    let (name, document) = split_policy(parse_json(&body)?);
    let analysis = PolicyAnalysis::analyze(&name, &document)?;

    let prediction = match state.ctx.model_for_deriver(Theme::Iam.as_str()) {
        Some(loaded) => Some(loaded.pipeline.predict(&loaded.model, &loaded.schema, &analysis.record)?),
        None => None,
    };

    tracing::debug!(
        "Policy '{}': rules {:?} (score {}), model {:?}",
        name,
        analysis.rules.risk_level,
        analysis.rules.risk_score,
        prediction.as_ref().map(|p| p.class_label.as_str())
    );

    Ok(Json(PolicyResponse { analysis, prediction }))
}

pub async fn flows(State(state): State<AppState>, body: Bytes) -> AppResult<Json<FlowsResponse>> {
    let items = match parse_json(&body)? {
        Value::Array(items) => items,
        _ => return Err(AppError::BadRequest("expected a JSON array of flow objects".to_string())),
    };
    let records = items
        .into_iter()
        .map(RawRecord::from_value)
        .collect::<Result<Vec<_>, _>>()?;

    let rules = analyze_flows(&records);

    let predictions = match state.ctx.model_for_deriver(Theme::Flows.as_str()) {
        Some(loaded) => Some(loaded.pipeline.predict_batch(&loaded.model, &loaded.schema, &records)?),
        None => None,
    };
    let summary = predictions.as_deref().map(PredictionSummary::from_predictions);

    tracing::info!(
        "Analyzed {} flows: {} rule findings, risk {:?}",
        records.len(),
        rules.num_findings,
        rules.risk_level
    );

    Ok(Json(FlowsResponse { rules, predictions, summary }))
}
