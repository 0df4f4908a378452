//! Artifacts Module - model + schema persistence
//!
//! Layout of an artifact directory:
//! - `model.json` - forest + metadata (carries the schema layout hash)
//! - `feature_columns.json` - JSON list of column names
//! - `report.json` - evaluation report of the run that wrote them

pub mod storage;


pub use storage::{ArtifactStore, TrainingReport};
