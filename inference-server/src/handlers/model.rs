//! Model info handler

use axum::{extract::State, Json};
use serde::Serialize;

use sentinel_core::logic::artifacts::TrainingReport;
use sentinel_core::logic::pipeline::ModelMetadata;

use crate::error::AppResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ModelResponse {
    metadata: ModelMetadata,
    schema_hash: String,
    columns: Vec<String>,
    report: Option<TrainingReport>,
}

pub async fn info(State(state): State<AppState>) -> AppResult<Json<ModelResponse>> {
    let loaded = state.ctx.model()?;

    Ok(Json(ModelResponse {
        metadata: loaded.model.metadata.clone(),
        schema_hash: format!("{:08x}", loaded.schema.hash()),
        columns: loaded.schema.columns().to_vec(),
        report: loaded.report.clone(),
    }))
}
