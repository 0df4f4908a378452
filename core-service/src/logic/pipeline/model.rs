//! Trained model artifact: forest + metadata binding it to its schema

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::model::{ForestParams, RandomForest};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Shared by every artifact written by one training run
    pub run_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub model_type: String,
    /// Feature deriver the model was trained with
    pub deriver: String,
    pub label_field: String,
    /// Layout hash of the schema the forest was fit on
    pub schema_hash: u32,
    pub n_features: usize,
    /// Sorted class labels; class index `i` is `classes[i]`
    pub classes: Vec<String>,
    pub params: ForestParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub metadata: ModelMetadata,
    pub forest: RandomForest,
}

impl TrainedModel {
    pub fn classes(&self) -> &[String] {
        &self.metadata.classes
    }

    pub fn n_features(&self) -> usize {
        self.metadata.n_features
    }

    pub fn schema_hash(&self) -> u32 {
        self.metadata.schema_hash
    }

    pub fn run_id(&self) -> Uuid {
        self.metadata.run_id
    }
}
