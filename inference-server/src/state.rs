//! Read-only service context, built once at startup

use std::sync::Arc;

use sentinel_core::logic::artifacts::TrainingReport;
use sentinel_core::{ArtifactStore, FeatureSchema, Pipeline, PipelineError, PipelineResult, TrainedModel};

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// A verified model/schema pair and the pipeline it was trained with
#[derive(Debug)]
pub struct LoadedModel {
    pub model: TrainedModel,
    pub schema: FeatureSchema,
    pub pipeline: Pipeline,
    pub report: Option<TrainingReport>,
}

impl LoadedModel {
    pub fn new(model: TrainedModel, schema: FeatureSchema) -> PipelineResult<Self> {
        let pipeline = Pipeline::for_model(&model)?;
        pipeline.check_pair(&model, &schema)?;
        Ok(Self {
            model,
            schema,
            pipeline,
            report: None,
        })
    }
}

#[derive(Debug, Default)]
pub struct ServiceContext {
    model: Option<LoadedModel>,
}

impl ServiceContext {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_model(loaded: LoadedModel) -> Self {
        Self { model: Some(loaded) }
    }

    /// Load artifacts from the store. Missing artifacts are only an error
    /// when `require_model` is set; a broken pair always is.
    pub fn load(store: &ArtifactStore, require_model: bool) -> PipelineResult<Self> {
        if !store.exists() {
            if require_model {
                return Err(PipelineError::ArtifactMissing(store.model_path()));
            }
            tracing::warn!(
                "No model in {}, serving without one (REQUIRE_MODEL=false)",
                store.dir().display()
            );
            return Ok(Self::empty());
        }

        let (model, schema) = store.load()?;
        let mut loaded = LoadedModel::new(model, schema)?;
        loaded.report = Self::matching_report(store, &loaded.model);
        Ok(Self::with_model(loaded))
    }

    /// The run report, only when it was written for this model
    fn matching_report(store: &ArtifactStore, model: &TrainedModel) -> Option<TrainingReport> {
        match store.load_report() {
            Ok(report) if report.run_id == model.run_id() => Some(report),
            Ok(report) => {
                tracing::warn!(
                    "Ignoring report for run {}, loaded model is run {}",
                    report.run_id,
                    model.run_id()
                );
                None
            }
            Err(PipelineError::ArtifactMissing(_)) => None,
            Err(e) => {
                tracing::warn!("Ignoring unreadable report {}: {}", store.report_path().display(), e);
                None
            }
        }
    }

    pub fn model(&self) -> AppResult<&LoadedModel> {
        self.model.as_ref().ok_or(AppError::ModelNotLoaded)
    }

    /// The loaded model, only when it was trained with `deriver`
    pub fn model_for_deriver(&self, deriver: &str) -> Option<&LoadedModel> {
        self.model
            .as_ref()
            .filter(|loaded| loaded.pipeline.builder().deriver_name() == deriver)
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<ServiceContext>,
    pub config: Config,
}

impl AppState {
    pub fn new(ctx: ServiceContext, config: Config) -> Self {
        Self {
            ctx: Arc::new(ctx),
            config,
        }
    }
}
