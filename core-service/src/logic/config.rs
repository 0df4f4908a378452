//! Training configuration

use std::path::PathBuf;
use serde::{Deserialize, Serialize};

use crate::constants::{
    get_artifact_dir, DEFAULT_LABEL_FIELD, DEFAULT_SAMPLES, DEFAULT_SEED, DEFAULT_TEST_FRACTION,
};
use crate::logic::model::ForestParams;
use crate::logic::synthetic::Theme;

/// Everything a training run needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Generator + deriver pair
    pub theme: Theme,

    /// Rows to synthesize when no dataset file exists
    pub samples: usize,

    /// Seed for the synthetic generator
    pub seed: u64,

    /// Share of rows held out for evaluation (0 disables holdout)
    pub test_fraction: f64,

    /// Field carrying the class label
    pub label_field: String,

    /// Existing JSONL dataset. Generated and written here when missing.
    pub dataset_path: Option<PathBuf>,

    /// Where model, schema and report are persisted
    pub artifact_dir: PathBuf,

    pub forest: ForestParams,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Flows,
            samples: DEFAULT_SAMPLES,
            seed: DEFAULT_SEED,
            test_fraction: DEFAULT_TEST_FRACTION,
            label_field: DEFAULT_LABEL_FIELD.to_string(),
            dataset_path: None,
            artifact_dir: get_artifact_dir(),
            forest: ForestParams::default(),
        }
    }
}

impl TrainingConfig {
    pub fn for_theme(theme: Theme) -> Self {
        Self {
            theme,
            ..Self::default()
        }
    }

    /// Validate ranges before any work is done
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..1.0).contains(&self.test_fraction) {
            return Err(format!("test_fraction must be in [0, 1), got {}", self.test_fraction));
        }
        if self.forest.n_estimators == 0 {
            return Err("n_estimators must be at least 1".to_string());
        }
        if self.label_field.is_empty() {
            return Err("label_field must not be empty".to_string());
        }
        Ok(())
    }
}
