//! Central Configuration Constants
//!
//! Single source of truth for artifact names and pipeline defaults.

use std::path::PathBuf;

/// Model artifact file name (forest + metadata)
pub const MODEL_FILE: &str = "model.json";

/// Feature schema artifact file name (JSON list of column names)
pub const SCHEMA_FILE: &str = "feature_columns.json";

/// Training report file name
pub const REPORT_FILE: &str = "report.json";

/// Default synthetic dataset file name
pub const DATASET_FILE: &str = "dataset.jsonl";

/// Field holding the class label in raw training rows
pub const DEFAULT_LABEL_FIELD: &str = "label";

/// Schema layout version, mixed into the schema hash.
/// MUST be incremented when the hashing scheme or column naming changes.
pub const SCHEMA_LAYOUT_VERSION: u8 = 1;

/// Default number of synthetic rows per training run
pub const DEFAULT_SAMPLES: usize = 5000;

/// Default RNG seed for generators and the forest
pub const DEFAULT_SEED: u64 = 42;

/// Default share of rows held out for evaluation
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// App name
pub const APP_NAME: &str = "sentinel";

/// Get the base directory for artifacts and datasets
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default artifact directory, `<data_local_dir>/sentinel/artifacts`
pub fn get_artifact_dir() -> PathBuf {
    std::env::var("ARTIFACT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| get_data_dir().join("artifacts"))
}
