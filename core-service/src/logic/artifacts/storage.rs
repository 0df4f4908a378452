use std::fs;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{MODEL_FILE, REPORT_FILE, SCHEMA_FILE};
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::FeatureSchema;
use crate::logic::model::ClassificationReport;
use crate::logic::pipeline::TrainedModel;

/// Summary of one training run, persisted next to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub run_id: Uuid,
    pub model: String,
    pub deriver: String,
    pub num_samples: usize,
    pub num_train: usize,
    pub num_test: usize,
    pub num_features: usize,
    pub classes: Vec<String>,
    /// None when the dataset was too small for a holdout split
    pub evaluation: Option<ClassificationReport>,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    pub fn schema_path(&self) -> PathBuf {
        self.dir.join(SCHEMA_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.dir.join(REPORT_FILE)
    }

    /// Both halves of the model/schema pair are present
    pub fn exists(&self) -> bool {
        self.model_path().exists() && self.schema_path().exists()
    }

    /// Persist a model, its schema and the run report as one unit
    pub fn save(
        &self,
        model: &TrainedModel,
        schema: &FeatureSchema,
        report: Option<&TrainingReport>,
    ) -> PipelineResult<()> {
        if model.schema_hash() != schema.hash() {
            return Err(PipelineError::SchemaMismatch {
                expected: model.schema_hash(),
                actual: schema.hash(),
            });
        }

        fs::create_dir_all(&self.dir)?;

        // Every file is staged before any target is replaced, so a failed
        // write leaves the previous pair untouched
        let mut staged = vec![
            StagedFile::stage(self.schema_path(), schema)?,
            StagedFile::stage(self.model_path(), model)?,
        ];
        if let Some(report) = report {
            staged.push(StagedFile::stage(self.report_path(), report)?);
        }
        write_staged(&staged)?;

        for file in &staged {
            fs::rename(&file.tmp, &file.target)?;
        }

        // A report from an older run would describe the wrong model
        if report.is_none() && self.report_path().exists() {
            fs::remove_file(self.report_path())?;
        }

        log::info!(
            "Saved model {} ({} features) to {}",
            model.run_id(),
            schema.len(),
            self.dir.display()
        );
        Ok(())
    }

    /// Load the pair and verify it belongs to one training run
    pub fn load(&self) -> PipelineResult<(TrainedModel, FeatureSchema)> {
        let model: TrainedModel = read_json(&self.model_path())?;
        let schema = FeatureSchema::load(&self.schema_path())?;

        if model.schema_hash() != schema.hash() || model.n_features() != schema.len() {
            return Err(PipelineError::SchemaMismatch {
                expected: model.schema_hash(),
                actual: schema.hash(),
            });
        }

        log::info!(
            "Loaded model {} trained {} ({} classes, {} features)",
            model.run_id(),
            model.metadata.trained_at.to_rfc3339(),
            model.classes().len(),
            schema.len()
        );
        Ok((model, schema))
    }

    pub fn load_report(&self) -> PipelineResult<TrainingReport> {
        read_json(&self.report_path())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> PipelineResult<T> {
    if !path.exists() {
        return Err(PipelineError::ArtifactMissing(path.to_path_buf()));
    }
    let data = fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}

/// Serialized artifact waiting next to its target
struct StagedFile {
    target: PathBuf,
    tmp: PathBuf,
    bytes: Vec<u8>,
}

impl StagedFile {
    fn stage<T: Serialize>(target: PathBuf, value: &T) -> PipelineResult<Self> {
        let bytes = serde_json::to_vec_pretty(value)?;
        let tmp = target.with_extension("json.tmp");
        Ok(Self { target, tmp, bytes })
    }
}

/// Write every temporary file; on failure remove the ones already written
fn write_staged(files: &[StagedFile]) -> PipelineResult<()> {
    for (i, file) in files.iter().enumerate() {
        if let Err(e) = fs::write(&file.tmp, &file.bytes) {
            for written in &files[..i] {
                let _ = fs::remove_file(&written.tmp);
            }
            log::warn!("Could not stage {}: {}", file.tmp.display(), e);
            return Err(e.into());
        }
    }
    Ok(())
}
