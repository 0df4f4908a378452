use anyhow::{Context, Result};
use tracing::info;

use sentinel_core::{TrainingConfig, TrainingRun};

pub fn run(config: &TrainingConfig) -> Result<()> {
    info!(
        "Training {} model: {} trees, artifacts in {}",
        config.theme,
        config.forest.n_estimators,
        config.artifact_dir.display()
    );

    let outcome = TrainingRun::execute(config).context("training run failed")?;
    let report = &outcome.report;

    info!(
        "Run {}: {} rows ({} train / {} test), {} features, classes {:?}",
        report.run_id,
        report.num_samples,
        report.num_train,
        report.num_test,
        report.num_features,
        report.classes
    );

    match &report.evaluation {
        Some(eval) => {
            info!("Holdout accuracy: {:.4}", eval.accuracy);
            for (class, m) in &eval.per_class {
                info!(
                    "  {:<20} precision {:.3}  recall {:.3}  f1 {:.3}  support {}",
                    class, m.precision, m.recall, m.f1_score, m.support
                );
            }
        }
        None => info!("No holdout evaluation"),
    }

    Ok(())
}
