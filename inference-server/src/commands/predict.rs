use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

use sentinel_core::logic::dataset::read_jsonl;
use sentinel_core::logic::pipeline::PredictionSummary;
use sentinel_core::{ArtifactStore, Pipeline};

/// Prints one prediction per input line, then the summary
pub fn run(input: &Path, artifact_dir: &Path, explain: bool) -> Result<()> {
    let (model, schema) = ArtifactStore::new(artifact_dir)
        .load()
        .with_context(|| format!("loading artifacts from {}", artifact_dir.display()))?;
    let pipeline = Pipeline::for_model(&model)?;

    let records = read_jsonl(input)?;
    let predictions = pipeline.predict_batch(&model, &schema, &records)?;

    for (record, prediction) in records.iter().zip(&predictions) {
        let line = if explain {
            let vector = pipeline.feature_vector(&schema, record)?;
            json!({ "prediction": prediction, "features": vector.to_log_entry(&schema) })
        } else {
            json!({ "prediction": prediction })
        };
        println!("{}", line);
    }

    let summary = PredictionSummary::from_predictions(&predictions);
    info!("Scored {} records: {:?}", summary.num_scored, summary.label_counts);
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
