//! Prediction handlers
//!
//! Bodies are taken as raw bytes so that malformed JSON gets the same
//! error shape as every other failure.

use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;
use serde_json::Value;

use sentinel_core::logic::pipeline::PredictionSummary;
use sentinel_core::{Prediction, RawRecord};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Serialize)]
pub struct PredictResponse {
    prediction: Prediction,
}

#[derive(Serialize)]
pub struct BatchResponse {
    predictions: Vec<Prediction>,
    summary: PredictionSummary,
}

pub(crate) fn parse_json(body: &[u8]) -> AppResult<Value> {
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("malformed JSON: {}", e)))
}

pub async fn single(State(state): State<AppState>, body: Bytes) -> AppResult<Json<PredictResponse>> {
    let loaded = state.ctx.model()?;
    let value = parse_json(&body)?;

    let prediction = loaded.pipeline.predict_value(&loaded.model, &loaded.schema, value)?;
    tracing::debug!(
        "Predicted {} ({:.3})",
        prediction.class_label,
        prediction.confidence
    );

    Ok(Json(PredictResponse { prediction }))
}

pub async fn batch(State(state): State<AppState>, body: Bytes) -> AppResult<Json<BatchResponse>> {
    let loaded = state.ctx.model()?;

    let items = match parse_json(&body)? {
        Value::Array(items) => items,
        _ => return Err(AppError::BadRequest("expected a JSON array of objects".to_string())),
    };
    let records = items
        .into_iter()
        .map(RawRecord::from_value)
        .collect::<Result<Vec<_>, _>>()?;

    let predictions = loaded.pipeline.predict_batch(&loaded.model, &loaded.schema, &records)?;
    let summary = PredictionSummary::from_predictions(&predictions);
    tracing::info!("Scored batch of {}: {:?}", summary.num_scored, summary.label_counts);

    Ok(Json(BatchResponse { predictions, summary }))
}
