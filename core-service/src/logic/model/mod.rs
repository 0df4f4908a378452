//! Model Module - Random Forest Classifier
//!
//! Trees, bagging and evaluation metrics. Knows nothing about
//! feature names; it consumes positional vectors only.

pub mod tree;
pub mod forest;
pub mod metrics;

// Re-export common types
pub use forest::{MaxFeatures, ForestParams, RandomForest};
pub use metrics::{ClassificationReport, ClassMetrics};
