//! Sentinel - training CLI and HTTP inference service
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        SENTINEL                          │
//! ├──────────────────────────────────────────────────────────┤
//! │  generate ──▶ dataset.jsonl                              │
//! │  train    ──▶ model.json + feature_columns.json + report │
//! │  predict  ──▶ JSON lines on stdout                       │
//! │  analyze  ──▶ rule findings (+ model view) as JSON       │
//! │  serve    ──▶ /health  /predict  /predict/batch  /model  │
//! │               /analyze/policy  /analyze/flows            │
//! │               (Axum, read-only ServiceContext)           │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod commands;
mod config;
mod error;
mod handlers;
mod state;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use clap::{Parser, Subcommand};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use sentinel_core::constants::{DEFAULT_SAMPLES, DEFAULT_SEED};
use sentinel_core::Theme;

use state::AppState;

/// Feature-schema-consistent train / predict pipeline
#[derive(Parser)]
#[command(name = "sentinel")]
#[command(about = "Train security classifiers and serve predictions")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a synthetic labeled dataset as JSONL
    Generate {
        /// Data theme (flows, iam, process, graph); defaults to $THEME
        #[arg(short, long)]
        theme: Option<Theme>,

        /// Number of rows
        #[arg(short = 'n', long, default_value_t = DEFAULT_SAMPLES)]
        samples: usize,

        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Output file
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Train a model and persist it with its feature schema
    Train {
        /// Data theme; defaults to $THEME
        #[arg(short, long)]
        theme: Option<Theme>,

        /// Rows to synthesize when no dataset exists
        #[arg(short = 'n', long)]
        samples: Option<usize>,

        /// JSONL dataset (generated here if missing)
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Artifact directory; defaults to $ARTIFACT_DIR
        #[arg(short, long)]
        artifacts: Option<PathBuf>,

        /// Number of trees
        #[arg(long)]
        trees: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,

        /// Holdout share (0 disables evaluation)
        #[arg(long)]
        test_fraction: Option<f64>,
    },

    /// Score JSONL records with a persisted model
    Predict {
        /// JSONL file, one record per line
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        artifacts: Option<PathBuf>,

        /// Also print the non-zero reindexed features of each record
        #[arg(long)]
        explain: bool,
    },

    /// Run the policy or flow rule engine, plus a matching model if present
    Analyze {
        /// IAM policy document (JSON)
        #[arg(long, conflicts_with = "flows")]
        policy: Option<PathBuf>,

        /// Flow records (JSONL)
        #[arg(long)]
        flows: Option<PathBuf>,

        #[arg(short, long)]
        artifacts: Option<PathBuf>,
    },

    /// Run the HTTP inference service
    Serve {
        #[arg(short, long)]
        artifacts: Option<PathBuf>,

        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        host: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let mut config = config::Config::from_env();

    init_logging(cli.verbose, config.is_production());

    match cli.command {
        Commands::Generate { theme, samples, seed, out } => {
            commands::generate::run(theme.unwrap_or(config.theme), samples, seed, &out)?;
        }
        Commands::Train {
            theme,
            samples,
            dataset,
            artifacts,
            trees,
            seed,
            test_fraction,
        } => {
            let mut training = sentinel_core::TrainingConfig::for_theme(theme.unwrap_or(config.theme));
            training.artifact_dir = artifacts.unwrap_or(config.artifact_dir);
            training.dataset_path = dataset;
            if let Some(samples) = samples {
                training.samples = samples;
            }
            if let Some(trees) = trees {
                training.forest.n_estimators = trees;
            }
            if let Some(seed) = seed {
                training.seed = seed;
                training.forest.seed = seed;
            }
            if let Some(test_fraction) = test_fraction {
                training.test_fraction = test_fraction;
            }
            commands::train::run(&training)?;
        }
        Commands::Predict { input, artifacts, explain } => {
            commands::predict::run(&input, &artifacts.unwrap_or(config.artifact_dir), explain)?;
        }
        Commands::Analyze { policy, flows, artifacts } => {
            commands::analyze::run(
                policy.as_deref(),
                flows.as_deref(),
                &artifacts.unwrap_or(config.artifact_dir),
            )?;
        }
        Commands::Serve { artifacts, port, host } => {
            if let Some(dir) = artifacts {
                config.artifact_dir = dir;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(host) = host {
                config.host = host;
            }
            commands::serve::run(config).await?;
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise info (debug with --verbose) for our crates
/// and tower_http. JSON lines in production.
fn init_logging(verbose: bool, json: bool) {
    let level = if verbose { "debug" } else { "info" };
    let default_filter = format!("sentinel={0},sentinel_core={0},tower_http={0}", level);

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt_layer)
        .init();
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/model", get(handlers::model::info))
        .route("/predict", post(handlers::predict::single))
        .route("/predict/batch", post(handlers::predict::batch))
        .route("/analyze/policy", post(handlers::analyze::policy))
        .route("/analyze/flows", post(handlers::analyze::flows))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
