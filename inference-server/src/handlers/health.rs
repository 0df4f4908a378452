//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    classes: Vec<String>,
    n_features: usize,
    version: &'static str,
    timestamp: i64,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (classes, n_features) = match state.ctx.model() {
        Ok(loaded) => (loaded.model.classes().to_vec(), loaded.schema.len()),
        Err(_) => (Vec::new(), 0),
    };

    Json(HealthResponse {
        status: "ok",
        model_loaded: state.ctx.is_loaded(),
        classes,
        n_features,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
    })
}
