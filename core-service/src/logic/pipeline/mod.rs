//! Pipeline Module - feature-schema-consistent train / predict
//!
//! `train` and `predict` both derive features through the same
//! `FeatureBuilder`, and every prediction checks that the model and the
//! schema come from the same training run.

pub mod model;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::{deriver_by_name, FeatureBuilder, FeatureSchema, FeatureVector, RawRecord};
use crate::logic::model::{ForestParams, RandomForest};

pub use model::{ModelMetadata, TrainedModel};

// ============================================================================
// PREDICTION OUTPUT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub class_label: String,
    /// Probability of `class_label`, the maximum class probability
    pub confidence: f64,
    pub probabilities: BTreeMap<String, f64>,
}

/// Label counts over a batch of predictions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub num_scored: usize,
    pub label_counts: BTreeMap<String, usize>,
}

impl PredictionSummary {
    pub fn from_predictions(predictions: &[Prediction]) -> Self {
        let mut label_counts = BTreeMap::new();
        for p in predictions {
            *label_counts.entry(p.class_label.clone()).or_insert(0) += 1;
        }
        Self {
            num_scored: predictions.len(),
            label_counts,
        }
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

#[derive(Debug, Clone)]
pub struct Pipeline {
    builder: FeatureBuilder,
    params: ForestParams,
}

impl Pipeline {
    pub fn new(builder: FeatureBuilder) -> Self {
        Self {
            builder,
            params: ForestParams::default(),
        }
    }

    pub fn with_params(mut self, params: ForestParams) -> Self {
        self.params = params;
        self
    }

    /// Rebuild the pipeline a persisted model was trained with
    pub fn for_model(model: &TrainedModel) -> PipelineResult<Self> {
        let deriver = deriver_by_name(&model.metadata.deriver).ok_or_else(|| {
            PipelineError::data(format!("unknown feature deriver '{}'", model.metadata.deriver))
        })?;

        let builder = FeatureBuilder::new(deriver).with_label_field(&model.metadata.label_field);
        Ok(Self::new(builder).with_params(model.metadata.params.clone()))
    }

    pub fn builder(&self) -> &FeatureBuilder {
        &self.builder
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Fit a forest and fix the feature schema.
    ///
    /// Fails with `Data` when there are no rows, a row has no label, or
    /// fewer than two distinct labels are present. The caller persists the
    /// returned pair together.
    pub fn train(&self, rows: &[RawRecord]) -> PipelineResult<(TrainedModel, FeatureSchema)> {
        if rows.is_empty() {
            return Err(PipelineError::data("no training rows"));
        }

        let label_field = self.builder.label_field();
        let labels = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.label(label_field).ok_or_else(|| {
                    PipelineError::data(format!("row {} has no '{}' label", i, label_field))
                })
            })
            .collect::<PipelineResult<Vec<String>>>()?;

        let classes: Vec<String> = labels.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect();
        if classes.len() < 2 {
            return Err(PipelineError::data(format!(
                "need at least two distinct labels, found {}",
                classes.len()
            )));
        }

        let feature_rows = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                self.builder.build(row).map_err(|e| match e {
                    PipelineError::InvalidInput(msg) => PipelineError::data(format!("row {}: {}", i, msg)),
                    other => other,
                })
            })
            .collect::<PipelineResult<Vec<_>>>()?;
        let schema = FeatureSchema::from_rows(&feature_rows);
        if schema.is_empty() {
            return Err(PipelineError::data("training rows produced no feature columns"));
        }

        let vectors: Vec<FeatureVector> = feature_rows.iter().map(|row| schema.reindex(row)).collect();
        let matrix = Array2::from_shape_fn((vectors.len(), schema.len()), |(i, j)| vectors[i].values[j]);

        // classes is sorted and contains every label
        let targets: Vec<usize> = labels
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or_default())
            .collect();

        let forest = RandomForest::fit(&matrix, &targets, classes.len(), &self.params)?;

        let metadata = ModelMetadata {
            run_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            model_type: "random_forest".to_string(),
            deriver: self.builder.deriver_name().to_string(),
            label_field: label_field.to_string(),
            schema_hash: schema.hash(),
            n_features: schema.len(),
            classes,
            params: self.params.clone(),
        };

        log::info!(
            "Trained {} trees on {} rows: {} features, classes {:?} (schema {:08x})",
            forest.n_trees(),
            rows.len(),
            schema.len(),
            metadata.classes,
            schema.hash()
        );

        Ok((TrainedModel { metadata, forest }, schema))
    }

    /// Verify a model/schema pair before use
    pub fn check_pair(&self, model: &TrainedModel, schema: &FeatureSchema) -> PipelineResult<()> {
        if model.schema_hash() != schema.hash() || model.n_features() != schema.len() {
            return Err(PipelineError::SchemaMismatch {
                expected: model.schema_hash(),
                actual: schema.hash(),
            });
        }

        if model.metadata.deriver != self.builder.deriver_name() {
            return Err(PipelineError::DeriverMismatch {
                expected: model.metadata.deriver.clone(),
                actual: self.builder.deriver_name().to_string(),
            });
        }

        Ok(())
    }

    /// Derive and reindex one record exactly as `train` does
    pub fn feature_vector(&self, schema: &FeatureSchema, record: &RawRecord) -> PipelineResult<FeatureVector> {
        let row = self.builder.build(record)?;
        if log::log_enabled!(log::Level::Debug) {
            let dropped = schema.unknown_columns(&row);
            if !dropped.is_empty() {
                log::debug!("Dropping columns unknown to the schema: {:?}", dropped);
            }
        }
        Ok(schema.reindex(&row))
    }

    pub fn predict(
        &self,
        model: &TrainedModel,
        schema: &FeatureSchema,
        record: &RawRecord,
    ) -> PipelineResult<Prediction> {
        self.check_pair(model, schema)?;
        let vector = self.feature_vector(schema, record)?;
        Ok(self.score(model, &vector))
    }

    /// Parse then predict; non-object JSON is `InvalidInput`
    pub fn predict_value(
        &self,
        model: &TrainedModel,
        schema: &FeatureSchema,
        value: serde_json::Value,
    ) -> PipelineResult<Prediction> {
        let record = RawRecord::from_value(value)?;
        self.predict(model, schema, &record)
    }

    pub fn predict_batch(
        &self,
        model: &TrainedModel,
        schema: &FeatureSchema,
        records: &[RawRecord],
    ) -> PipelineResult<Vec<Prediction>> {
        self.check_pair(model, schema)?;
        records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let vector = self.feature_vector(schema, record).map_err(|e| match e {
                    PipelineError::InvalidInput(msg) => {
                        PipelineError::invalid_input(format!("record {}: {}", i, msg))
                    }
                    other => other,
                })?;
                Ok(self.score(model, &vector))
            })
            .collect()
    }

    fn score(&self, model: &TrainedModel, vector: &FeatureVector) -> Prediction {
        let proba = model.forest.predict_proba(vector.as_slice());
        let (best, confidence) = crate::logic::model::forest::argmax(&proba);

        let classes = model.classes();
        let probabilities = classes.iter().cloned().zip(proba.iter().copied()).collect();

        Prediction {
            class_label: classes.get(best).cloned().unwrap_or_default(),
            confidence,
            probabilities,
        }
    }
}
