use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use tracing::info;

use sentinel_core::logic::dataset::read_jsonl;
use sentinel_core::logic::pipeline::PredictionSummary;
use sentinel_core::logic::rules::{analyze_flows, PolicyAnalysis};
use sentinel_core::{ArtifactStore, FeatureSchema, Pipeline, Theme, TrainedModel};

/// Model from `artifact_dir` when one exists and was trained on `theme`
fn model_for(artifact_dir: &Path, theme: Theme) -> Result<Option<(Pipeline, TrainedModel, FeatureSchema)>> {
    let store = ArtifactStore::new(artifact_dir);
    if !store.exists() {
        info!("No model in {}, reporting rules only", artifact_dir.display());
        return Ok(None);
    }

    let (model, schema) = store
        .load()
        .with_context(|| format!("loading artifacts from {}", artifact_dir.display()))?;
    if model.metadata.deriver != theme.as_str() {
        info!(
            "Model in {} is a {} model, reporting {} rules only",
            artifact_dir.display(),
            model.metadata.deriver,
            theme
        );
        return Ok(None);
    }

    let pipeline = Pipeline::for_model(&model)?;
    Ok(Some((pipeline, model, schema)))
}

/// Prints the rule report for a policy document or a JSONL flow batch,
/// with the model's view when a matching model is available
pub fn run(policy: Option<&Path>, flows: Option<&Path>, artifact_dir: &Path) -> Result<()> {
    let output = match (policy, flows) {
        (Some(path), None) => {
            let document: Value = serde_json::from_slice(&fs::read(path)?)
                .with_context(|| format!("parsing policy {}", path.display()))?;
            let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("policy");
            let analysis = PolicyAnalysis::analyze(name, &document)?;

            let prediction = match model_for(artifact_dir, Theme::Iam)? {
                Some((pipeline, model, schema)) => Some(pipeline.predict(&model, &schema, &analysis.record)?),
                None => None,
            };
            info!(
                "Policy '{}': {} findings, risk {:?} (score {})",
                name,
                analysis.rules.num_findings,
                analysis.rules.risk_level,
                analysis.rules.risk_score
            );
            json!({ "analysis": analysis, "prediction": prediction })
        }
        (None, Some(path)) => {
            let records = read_jsonl(path)?;
            let rules = analyze_flows(&records);

            let predictions = match model_for(artifact_dir, Theme::Flows)? {
                Some((pipeline, model, schema)) => Some(pipeline.predict_batch(&model, &schema, &records)?),
                None => None,
            };
            let summary = predictions.as_deref().map(PredictionSummary::from_predictions);
            info!(
                "Analyzed {} flows: {} findings, risk {:?}",
                records.len(),
                rules.num_findings,
                rules.risk_level
            );
            json!({ "rules": rules, "predictions": predictions, "summary": summary })
        }
        _ => bail!("pass exactly one of --policy or --flows"),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
