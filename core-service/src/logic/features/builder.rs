//! Feature Builder - the single derivation path
//!
//! Training and inference both call `FeatureBuilder::build`. Never add a
//! second code path that turns raw records into columns.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::constants::DEFAULT_LABEL_FIELD;
use crate::logic::error::{PipelineError, PipelineResult};
use super::derivers::{FeatureDeriver, GenericDeriver};
use super::record::{RawRecord, RawValue};

/// Named numeric columns for one record (sorted by name)
pub type FeatureRow = BTreeMap<String, f64>;

/// One-hot column name, e.g. `protocol_TCP`
pub fn one_hot_column(field: &str, category: &str) -> String {
    format!("{}_{}", field, category)
}

#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    deriver: Arc<dyn FeatureDeriver>,
    label_field: String,
}

impl FeatureBuilder {
    pub fn new(deriver: Arc<dyn FeatureDeriver>) -> Self {
        Self {
            deriver,
            label_field: DEFAULT_LABEL_FIELD.to_string(),
        }
    }

    /// Builder with no theme-specific columns
    pub fn generic() -> Self {
        Self::new(Arc::new(GenericDeriver))
    }

    pub fn with_label_field(mut self, field: &str) -> Self {
        self.label_field = field.to_string();
        self
    }

    pub fn label_field(&self) -> &str {
        &self.label_field
    }

    pub fn deriver_name(&self) -> &'static str {
        self.deriver.name()
    }

    /// Expand a raw record into named numeric columns.
    ///
    /// Fails with `InvalidInput` when two sources would write the same
    /// column (e.g. `y: "a"` next to a raw `y_a`, or a raw field named like
    /// a derived column).
    pub fn build(&self, record: &RawRecord) -> PipelineResult<FeatureRow> {
        let ignored = self.deriver.ignored_fields();
        let categorical = self.deriver.categorical_fields();
        let mut row = FeatureRow::new();

        for (field, value) in record.iter() {
            if field == self.label_field || ignored.contains(&field) {
                continue;
            }

            match value {
                RawValue::Null => {}
                RawValue::Bool(b) => {
                    put(&mut row, field.to_string(), if *b { 1.0 } else { 0.0 }, field)?;
                }
                RawValue::Number(n) if categorical.contains(&field) => {
                    let category = value.to_category().unwrap_or_else(|| n.to_string());
                    put(&mut row, one_hot_column(field, &category), 1.0, field)?;
                }
                RawValue::Number(n) => {
                    put(&mut row, field.to_string(), *n, field)?;
                }
                RawValue::Text(s) => {
                    put(&mut row, one_hot_column(field, s), 1.0, field)?;
                }
            }
        }

        let mut derived = FeatureRow::new();
        self.deriver.derive(record, &mut derived);
        for (column, value) in derived {
            if row.contains_key(&column) {
                return Err(PipelineError::invalid_input(format!(
                    "raw field collides with derived column '{}' of the {} deriver",
                    column,
                    self.deriver.name()
                )));
            }
            row.insert(column, value);
        }

        Ok(row)
    }
}

fn put(row: &mut FeatureRow, column: String, value: f64, field: &str) -> PipelineResult<()> {
    if row.contains_key(&column) {
        return Err(PipelineError::invalid_input(format!(
            "field '{}' produces column '{}', which another field already produced",
            field, column
        )));
    }
    row.insert(column, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::derivers::FlowDeriver;

    #[test]
    fn test_generic_expansion() {
        let record = RawRecord::new()
            .with("x", 1i64)
            .with("y", "a")
            .with("flag", true)
            .with("label", "low");

        let row = FeatureBuilder::generic().build(&record).unwrap();

        assert_eq!(row.len(), 3);
        assert_eq!(row["x"], 1.0);
        assert_eq!(row["y_a"], 1.0);
        assert_eq!(row["flag"], 1.0);
        assert!(!row.contains_key("label"));
    }

    #[test]
    fn test_custom_label_field_is_skipped() {
        let record = RawRecord::new().with("x", 1i64).with("family", "benign");
        let row = FeatureBuilder::generic().with_label_field("family").build(&record).unwrap();
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn test_flow_deriver_categorical_port() {
        let record = RawRecord::new()
            .with("src_ip", "10.0.0.1")
            .with("src_port", 50123i64)
            .with("dst_port", 443i64)
            .with("protocol", "TCP")
            .with("bytes_in", 10i64)
            .with("bytes_out", 4i64);

        let row = FeatureBuilder::new(Arc::new(FlowDeriver)).build(&record).unwrap();

        assert_eq!(row.get("dst_port_443"), Some(&1.0));
        assert!(!row.contains_key("dst_port"));
        assert!(!row.contains_key("src_port"));
        assert!(!row.keys().any(|k| k.starts_with("src_ip")));
        assert_eq!(row.get("byte_ratio"), Some(&(11.0 / 5.0)));
    }

    #[test]
    fn test_one_hot_colliding_with_raw_column_is_rejected() {
        let record = RawRecord::new().with("y", "a").with("y_a", 5i64);
        let err = FeatureBuilder::generic().build(&record).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(msg) if msg.contains("'y_a'")));

        // Same names without an overlap are fine
        let record = RawRecord::new().with("y", "b").with("y_a", 5i64);
        let row = FeatureBuilder::generic().build(&record).unwrap();
        assert_eq!(row.get("y_b"), Some(&1.0));
        assert_eq!(row.get("y_a"), Some(&5.0));
    }

    #[test]
    fn test_raw_field_shadowing_derived_column_is_rejected() {
        let record = RawRecord::new()
            .with("bytes_in", 10i64)
            .with("bytes_out", 4i64)
            .with("byte_ratio", 0.5);
        let err = FeatureBuilder::new(Arc::new(FlowDeriver)).build(&record).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(msg) if msg.contains("byte_ratio")));
    }
}
