//! Training run: dataset -> holdout split -> train -> evaluate -> persist

use std::collections::BTreeMap;
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::constants::DATASET_FILE;
use crate::logic::artifacts::{ArtifactStore, TrainingReport};
use crate::logic::config::TrainingConfig;
use crate::logic::dataset::{read_jsonl, DatasetWriter};
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::{FeatureSchema, RawRecord};
use crate::logic::model::metrics::classification_report;
use crate::logic::pipeline::{Pipeline, TrainedModel};
use crate::logic::synthetic;

/// What a successful run produced (already persisted)
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: TrainedModel,
    pub schema: FeatureSchema,
    pub report: TrainingReport,
}

/// Row indices of a holdout split
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

pub struct TrainingRun;

impl TrainingRun {
    pub fn execute(config: &TrainingConfig) -> PipelineResult<TrainingOutcome> {
        config
            .validate()
            .map_err(|e| PipelineError::invalid_input(format!("training config: {}", e)))?;

        let rows = Self::load_or_generate(config)?;
        let pipeline = Pipeline::new(config.theme.builder(&config.label_field))
            .with_params(config.forest.clone());

        let labels = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.label(&config.label_field).ok_or_else(|| {
                    PipelineError::data(format!("row {} has no '{}' label", i, config.label_field))
                })
            })
            .collect::<PipelineResult<Vec<String>>>()?;

        let split = stratified_split(&labels, config.test_fraction, config.seed);
        if split.test.is_empty() && config.test_fraction > 0.0 {
            log::warn!("Dataset too small for a holdout split, training on all {} rows", rows.len());
        }

        let train_rows: Vec<RawRecord> = split.train.iter().map(|&i| rows[i].clone()).collect();
        let test_rows: Vec<RawRecord> = split.test.iter().map(|&i| rows[i].clone()).collect();

        // Nothing is written before training succeeds
        let (model, schema) = pipeline.train(&train_rows)?;

        let evaluation = if test_rows.is_empty() {
            None
        } else {
            let predictions = pipeline.predict_batch(&model, &schema, &test_rows)?;
            let y_true: Vec<String> = split.test.iter().map(|&i| labels[i].clone()).collect();
            let y_pred: Vec<String> = predictions.into_iter().map(|p| p.class_label).collect();
            let report = classification_report(model.classes(), &y_true, &y_pred);
            log::info!(
                "Holdout accuracy {:.4} on {} rows (macro f1 {:.4})",
                report.accuracy,
                y_true.len(),
                report.macro_avg.f1_score
            );
            Some(report)
        };

        let report = TrainingReport {
            run_id: model.run_id(),
            model: model.metadata.model_type.clone(),
            deriver: model.metadata.deriver.clone(),
            num_samples: rows.len(),
            num_train: train_rows.len(),
            num_test: test_rows.len(),
            num_features: schema.len(),
            classes: model.classes().to_vec(),
            evaluation,
        };

        ArtifactStore::new(&config.artifact_dir).save(&model, &schema, Some(&report))?;

        Ok(TrainingOutcome { model, schema, report })
    }

    /// Read the configured dataset, or synthesize one and write it where
    /// the next run will find it
    pub fn load_or_generate(config: &TrainingConfig) -> PipelineResult<Vec<RawRecord>> {
        let path = Self::dataset_path(config);
        if path.exists() {
            let rows = read_jsonl(&path)?;
            log::info!("Loaded {} rows from {}", rows.len(), path.display());
            return Ok(rows);
        }

        log::info!(
            "No dataset at {}, generating {} {} rows",
            path.display(),
            config.samples,
            config.theme
        );
        let rows = synthetic::generate(config.theme, config.samples, config.seed);
        DatasetWriter::new(&path).write_all(&rows)?;
        Ok(rows)
    }

    fn dataset_path(config: &TrainingConfig) -> PathBuf {
        config
            .dataset_path
            .clone()
            .unwrap_or_else(|| config.artifact_dir.join(DATASET_FILE))
    }
}

/// Per-class shuffled holdout. Every class keeps at least one training
/// row; with no class of two or more rows the holdout is empty.
pub fn stratified_split(labels: &[String], test_fraction: f64, seed: u64) -> Split {
    let mut by_class: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        by_class.entry(label.as_str()).or_default().push(i);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut split = Split::default();

    for (_, mut indices) in by_class {
        indices.shuffle(&mut rng);
        let wanted = (indices.len() as f64 * test_fraction).round() as usize;
        let n_test = wanted.min(indices.len().saturating_sub(1));
        split.test.extend_from_slice(&indices[..n_test]);
        split.train.extend_from_slice(&indices[n_test..]);
    }

    split.train.sort_unstable();
    split.test.sort_unstable();
    split
}
