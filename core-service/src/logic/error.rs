//! Pipeline error type

use std::path::PathBuf;
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Training data cannot produce a model (no rows, missing label, one class)
    #[error("Data error: {0}")]
    Data(String),

    /// Model and schema were not produced by the same training run
    #[error("Schema mismatch: model expects {expected:08x}, schema is {actual:08x}")]
    SchemaMismatch { expected: u32, actual: u32 },

    /// Model was trained with a different feature deriver
    #[error("Deriver mismatch: model trained with '{expected}', pipeline uses '{actual}'")]
    DeriverMismatch { expected: String, actual: String },

    /// Raw record is not a flat key/value object
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Artifact not found: {}", .0.display())]
    ArtifactMissing(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn data(msg: impl Into<String>) -> Self {
        PipelineError::Data(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        PipelineError::InvalidInput(msg.into())
    }
}
