//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use sentinel_core::PipelineError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    /// Service started without artifacts
    ModelNotLoaded,

    /// Body is not JSON or not the expected shape
    BadRequest(String),

    /// Well-formed request the pipeline cannot score
    Unprocessable(String),

    /// Model/schema pair is inconsistent
    ModelMismatch(String),

    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::ModelNotLoaded => (StatusCode::SERVICE_UNAVAILABLE, "Model not loaded"),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.as_str()),
            AppError::ModelMismatch(msg) => {
                tracing::error!("Model mismatch: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Model and feature schema do not match")
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidInput(msg) => AppError::BadRequest(msg),
            PipelineError::Data(msg) => AppError::Unprocessable(msg),
            e @ (PipelineError::SchemaMismatch { .. } | PipelineError::DeriverMismatch { .. }) => {
                AppError::ModelMismatch(e.to_string())
            }
            e => AppError::InternalError(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_status_codes() {
        let status = |e: PipelineError| AppError::from(e).into_response().status();

        assert_eq!(status(PipelineError::invalid_input("x")), StatusCode::BAD_REQUEST);
        assert_eq!(status(PipelineError::data("x")), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            status(PipelineError::SchemaMismatch { expected: 1, actual: 2 }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::ModelNotLoaded.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
