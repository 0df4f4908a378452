//! Integration tests: builder + schema working together

use std::sync::Arc;
use serde_json::json;

use super::{FeatureBuilder, FeatureRow, FeatureSchema, RawRecord};
use super::derivers::IamDeriver;

fn record(value: serde_json::Value) -> RawRecord {
    RawRecord::from_value(value).unwrap()
}

#[test]
fn test_vector_width_ignores_field_order_and_extras() {
    let builder = FeatureBuilder::generic();
    let rows: Vec<FeatureRow> = [
        json!({"a": 1, "b": 2, "c": "x"}),
        json!({"a": 3, "c": "y"}),
    ]
    .into_iter()
    .map(|v| builder.build(&record(v)).unwrap())
    .collect();
    let schema = FeatureSchema::from_rows(&rows);

    let shuffled = record(json!({"extra": 7, "c": "x", "b": 5, "unseen": "q"}));
    let vector = schema.reindex(&builder.build(&shuffled).unwrap());

    assert_eq!(vector.len(), schema.len());
    assert_eq!(schema.columns(), &["a", "b", "c_x", "c_y"]);
    assert_eq!(vector.as_slice(), &[0.0, 5.0, 1.0, 0.0]);
}

#[test]
fn test_training_and_inference_paths_agree() {
    let builder = FeatureBuilder::new(Arc::new(IamDeriver));
    let raw = record(json!({
        "policy_name": "p-1",
        "num_statements": 4,
        "num_allow_statements": 3,
        "num_findings": 2,
        "principal_type": "public",
        "has_condition": false,
        "label": "high",
    }));

    let train_row = builder.build(&raw).unwrap();
    let schema = FeatureSchema::from_rows(std::slice::from_ref(&train_row));

    // Round trip through JSON as the HTTP layer would
    let wire = serde_json::to_vec(&raw).unwrap();
    let served = RawRecord::from_json_slice(&wire).unwrap();

    assert_eq!(schema.reindex(&train_row), schema.reindex(&builder.build(&served).unwrap()));
    assert_eq!(schema.index_of("policy_name_p-1"), None);
    assert_eq!(
        schema.reindex(&train_row).get_by_name(&schema, "findings_per_statement"),
        Some(0.5)
    );
}

#[test]
fn test_empty_record_reindexes_to_zeros() {
    let builder = FeatureBuilder::generic();
    let schema = FeatureSchema::new(vec!["x".into(), "y_a".into()]).unwrap();
    let vector = schema.reindex(&builder.build(&RawRecord::new()).unwrap());
    assert!(vector.is_all_zero());
    assert_eq!(vector.len(), 2);
}
