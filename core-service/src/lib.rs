//! Sentinel Core - Train/Serve Pipeline
//!
//! One parameterized pipeline replacing the per-project copies:
//!
//! ```text
//! ┌──────────────┐   ┌────────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  synthetic   │──▶│ FeatureBuilder │──▶│ RandomForest │──▶│ ArtifactStore│
//! │  generator   │   │ + deriver      │   │   (train)    │   │ model+schema │
//! └──────────────┘   └───────┬────────┘   └──────────────┘   └──────┬───────┘
//!                            │  same code path                      │
//!                            ▼                                      ▼
//!                     ┌────────────────┐                    ┌──────────────┐
//!                     │ FeatureSchema  │◀───── reindex ─────│   predict    │
//!                     └────────────────┘                    └──────────────┘
//! ```

pub mod constants;
pub mod logic;

pub use logic::artifacts::ArtifactStore;
pub use logic::config::TrainingConfig;
pub use logic::error::{PipelineError, PipelineResult};
pub use logic::features::{FeatureBuilder, FeatureSchema, FeatureVector, RawRecord};
pub use logic::model::{ForestParams, RandomForest};
pub use logic::pipeline::{Pipeline, Prediction, TrainedModel};
pub use logic::run::{TrainingOutcome, TrainingRun};
pub use logic::synthetic::Theme;
