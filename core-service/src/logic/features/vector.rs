//! Feature Vector - fixed-width model input tagged with its schema hash

use serde::{Deserialize, Serialize};

use crate::logic::error::{PipelineError, PipelineResult};
use super::schema::FeatureSchema;

/// Values in schema order. Only `FeatureSchema::reindex` should build these
/// for model input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Layout hash of the schema the values were aligned to
    pub schema_hash: u32,
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(schema_hash: u32, values: Vec<f64>) -> Self {
        Self { schema_hash, values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn get_by_name(&self, schema: &FeatureSchema, name: &str) -> Option<f64> {
        schema.index_of(name).and_then(|i| self.get(i))
    }

    /// True when every entry is zero (record shared no column with the schema)
    pub fn is_all_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    /// Check the vector was aligned to `schema`
    pub fn validate(&self, schema: &FeatureSchema) -> PipelineResult<()> {
        if self.schema_hash != schema.hash() || self.len() != schema.len() {
            return Err(PipelineError::SchemaMismatch {
                expected: schema.hash(),
                actual: self.schema_hash,
            });
        }
        Ok(())
    }

    /// JSON-friendly form for debug logging
    pub fn to_log_entry(&self, schema: &FeatureSchema) -> serde_json::Value {
        serde_json::json!({
            "schema_hash": format!("{:08x}", self.schema_hash),
            "named_values": schema.columns().iter()
                .zip(self.values.iter())
                .filter(|(_, v)| **v != 0.0)
                .map(|(name, value)| (name.clone(), *value))
                .collect::<std::collections::BTreeMap<_, _>>(),
        })
    }
}
