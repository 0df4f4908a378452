//! Feature Schema - ordered column layout fixed at training time
//!
//! ## Rules
//! 1. The schema is created by `train` and never mutated afterwards
//! 2. Model and schema are persisted and loaded together
//! 3. The layout hash ties a model to the exact column order it was fit on

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::constants::SCHEMA_LAYOUT_VERSION;
use crate::logic::error::{PipelineError, PipelineResult};
use super::builder::FeatureRow;
use super::vector::FeatureVector;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 of the layout version and every column name, NUL separated
pub fn compute_layout_hash(columns: &[String]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[SCHEMA_LAYOUT_VERSION]);

    for name in columns {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }

    hasher.finalize()
}

// ============================================================================
// FEATURE SCHEMA
// ============================================================================

/// Serialized as a plain JSON list of column names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureSchema {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    hash: u32,
}

impl FeatureSchema {
    /// Columns must be unique; order is kept as given
    pub fn new(columns: Vec<String>) -> PipelineResult<Self> {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(PipelineError::data(format!("duplicate schema column '{}'", name)));
            }
        }

        let hash = compute_layout_hash(&columns);
        Ok(Self { columns, index, hash })
    }

    /// Sorted union of the columns seen across all rows
    pub fn from_rows(rows: &[FeatureRow]) -> Self {
        let union: BTreeSet<&String> = rows.iter().flat_map(|row| row.keys()).collect();
        let columns: Vec<String> = union.into_iter().cloned().collect();

        let index = columns.iter().enumerate().map(|(i, c)| (c.clone(), i)).collect();
        let hash = compute_layout_hash(&columns);
        Self { columns, index, hash }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    /// Align a feature row onto this layout.
    /// Missing columns are zero-filled, unknown columns dropped.
    pub fn reindex(&self, row: &FeatureRow) -> FeatureVector {
        let values = self
            .columns
            .iter()
            .map(|column| row.get(column).copied().unwrap_or(0.0))
            .collect();

        FeatureVector::new(self.hash, values)
    }

    /// Columns of `row` the schema does not know about
    pub fn unknown_columns<'a>(&self, row: &'a FeatureRow) -> Vec<&'a str> {
        row.keys()
            .filter(|k| !self.index.contains_key(k.as_str()))
            .map(|k| k.as_str())
            .collect()
    }

    /// Save as a JSON list of strings
    pub fn save(&self, path: &Path) -> PipelineResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(&self.columns)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> PipelineResult<Self> {
        if !path.exists() {
            return Err(PipelineError::ArtifactMissing(path.to_path_buf()));
        }

        let data = fs::read(path)?;
        let columns: Vec<String> = serde_json::from_slice(&data)?;
        Self::new(columns)
    }
}

impl TryFrom<Vec<String>> for FeatureSchema {
    type Error = PipelineError;

    fn try_from(columns: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(columns)
    }
}

impl From<FeatureSchema> for Vec<String> {
    fn from(schema: FeatureSchema) -> Self {
        schema.columns
    }
}

impl PartialEq for FeatureSchema {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

impl Eq for FeatureSchema {}
