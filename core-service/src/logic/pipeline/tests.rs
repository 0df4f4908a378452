use std::sync::Arc;
use serde_json::json;

use super::{Pipeline, PredictionSummary};
use crate::logic::error::PipelineError;
use crate::logic::features::derivers::FlowDeriver;
use crate::logic::features::{FeatureBuilder, FeatureSchema, RawRecord};
use crate::logic::model::ForestParams;

fn pipeline() -> Pipeline {
    Pipeline::new(FeatureBuilder::generic()).with_params(ForestParams {
        n_estimators: 15,
        ..ForestParams::default()
    })
}

fn rows(values: Vec<serde_json::Value>) -> Vec<RawRecord> {
    values.into_iter().map(|v| RawRecord::from_value(v).unwrap()).collect()
}

fn two_row_dataset() -> Vec<RawRecord> {
    rows(vec![
        json!({"x": 1, "y": "a", "label": "low"}),
        json!({"x": 2, "y": "b", "label": "high"}),
    ])
}

#[test]
fn test_end_to_end_schema_and_vectors() {
    let pipeline = pipeline();
    let (model, schema) = pipeline.train(&two_row_dataset()).unwrap();

    assert_eq!(schema.columns(), &["x", "y_a", "y_b"]);
    assert_eq!(model.classes(), &["high", "low"]);
    assert_eq!(model.schema_hash(), schema.hash());

    let seen = RawRecord::from_value(json!({"x": 1, "y": "a"})).unwrap();
    assert_eq!(pipeline.feature_vector(&schema, &seen).unwrap().as_slice(), &[1.0, 1.0, 0.0]);

    let unseen = RawRecord::from_value(json!({"x": 1, "y": "c"})).unwrap();
    assert_eq!(pipeline.feature_vector(&schema, &unseen).unwrap().as_slice(), &[1.0, 0.0, 0.0]);

    let prediction = pipeline.predict(&model, &schema, &unseen).unwrap();
    assert!(model.classes().contains(&prediction.class_label));
    assert!((0.0..=1.0).contains(&prediction.confidence));
}

#[test]
fn test_training_rows_reproduce_vectors() {
    let pipeline = pipeline();
    let data = rows(vec![
        json!({"bytes": 10, "proto": "TCP", "label": "normal"}),
        json!({"bytes": 9000, "proto": "UDP", "flag": true, "label": "dos"}),
        json!({"bytes": 12, "proto": "TCP", "label": "normal"}),
    ]);
    let (_, schema) = pipeline.train(&data).unwrap();

    for row in &data {
        let during_training = schema.reindex(&pipeline.builder().build(row).unwrap());
        assert_eq!(pipeline.feature_vector(&schema, row).unwrap(), during_training);
    }
}

#[test]
fn test_vector_width_matches_schema() {
    let pipeline = pipeline();
    let (_, schema) = pipeline.train(&two_row_dataset()).unwrap();

    for value in [
        json!({}),
        json!({"y": "b", "x": 5}),
        json!({"z": 1, "w": "nope", "x": 2, "y": "a", "label": "low"}),
    ] {
        let record = RawRecord::from_value(value).unwrap();
        assert_eq!(pipeline.feature_vector(&schema, &record).unwrap().len(), schema.len());
    }
}

#[test]
fn test_single_label_is_data_error() {
    let data = rows(vec![
        json!({"x": 1, "label": "low"}),
        json!({"x": 2, "label": "low"}),
    ]);
    let err = pipeline().train(&data).unwrap_err();
    assert!(matches!(err, PipelineError::Data(_)));
}

#[test]
fn test_missing_label_is_data_error() {
    let data = rows(vec![
        json!({"x": 1, "label": "low"}),
        json!({"x": 2}),
    ]);
    let err = pipeline().train(&data).unwrap_err();
    assert!(matches!(err, PipelineError::Data(msg) if msg.contains("row 1")));
}

#[test]
fn test_empty_dataset_is_data_error() {
    assert!(matches!(pipeline().train(&[]), Err(PipelineError::Data(_))));
}

#[test]
fn test_record_without_known_columns_still_predicts() {
    let pipeline = pipeline();
    let (model, schema) = pipeline.train(&two_row_dataset()).unwrap();

    let record = RawRecord::from_value(json!({"completely": "different"})).unwrap();
    assert!(pipeline.feature_vector(&schema, &record).unwrap().is_all_zero());

    let prediction = pipeline.predict(&model, &schema, &record).unwrap();
    let total: f64 = prediction.probabilities.values().sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn test_foreign_schema_is_rejected() {
    let pipeline = pipeline();
    let (model, _) = pipeline.train(&two_row_dataset()).unwrap();
    let other = FeatureSchema::new(vec!["x".into(), "y_b".into(), "y_a".into()]).unwrap();

    let record = RawRecord::from_value(json!({"x": 1})).unwrap();
    let err = pipeline.predict(&model, &other, &record).unwrap_err();
    assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
}

#[test]
fn test_other_deriver_is_rejected() {
    let (model, schema) = pipeline().train(&two_row_dataset()).unwrap();
    let flows = Pipeline::new(FeatureBuilder::new(Arc::new(FlowDeriver)));

    let record = RawRecord::from_value(json!({"x": 1})).unwrap();
    let err = flows.predict(&model, &schema, &record).unwrap_err();
    assert!(matches!(err, PipelineError::DeriverMismatch { .. }));
}

#[test]
fn test_for_model_restores_builder() {
    let custom = Pipeline::new(FeatureBuilder::generic().with_label_field("family"));
    let data = rows(vec![
        json!({"x": 1, "family": "benign"}),
        json!({"x": 9, "family": "ransomware_like"}),
    ]);
    let (model, schema) = custom.train(&data).unwrap();

    let restored = Pipeline::for_model(&model).unwrap();
    assert_eq!(restored.builder().label_field(), "family");
    assert!(restored.check_pair(&model, &schema).is_ok());
}

#[test]
fn test_predict_value_rejects_non_objects() {
    let pipeline = pipeline();
    let (model, schema) = pipeline.train(&two_row_dataset()).unwrap();
    let err = pipeline.predict_value(&model, &schema, json!("x=1")).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)));
}

#[test]
fn test_batch_summary_counts_labels() {
    let pipeline = pipeline();
    let (model, schema) = pipeline.train(&two_row_dataset()).unwrap();

    let batch = rows(vec![json!({"x": 1, "y": "a"}), json!({"x": 2, "y": "b"}), json!({})]);
    let predictions = pipeline.predict_batch(&model, &schema, &batch).unwrap();
    let summary = PredictionSummary::from_predictions(&predictions);

    assert_eq!(summary.num_scored, 3);
    assert_eq!(summary.label_counts.values().sum::<usize>(), 3);
}

#[test]
fn test_colliding_columns_fail_train_and_predict() {
    let pipeline = pipeline();
    let data = rows(vec![
        json!({"x": 1, "y": "a", "label": "low"}),
        json!({"x": 2, "y": "a", "y_a": 5, "label": "high"}),
    ]);
    let err = pipeline.train(&data).unwrap_err();
    assert!(matches!(err, PipelineError::Data(msg) if msg.contains("row 1")));

    let (model, schema) = pipeline.train(&two_row_dataset()).unwrap();
    let record = RawRecord::from_value(json!({"y": "a", "y_a": 5})).unwrap();
    let err = pipeline.predict(&model, &schema, &record).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)));

    let batch = rows(vec![json!({"x": 1}), json!({"y": "a", "y_a": 5})]);
    let err = pipeline.predict_batch(&model, &schema, &batch).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(msg) if msg.starts_with("record 1")));
}
