//! Logic Module - Pipeline Engines
//!
//! ## Layout
//! - `features/` - Raw records, derivation strategies, schema, vectors
//! - `model/` - Random forest classifier and metrics
//! - `pipeline/` - train / predict over one shared derivation path
//! - `artifacts/` - Model + schema persistence
//! - `rules/` - Policy and flow rule engines
//! - `synthetic/` - Themed dataset generators
//! - `dataset/` - JSONL dataset I/O
//! - `run` - End-to-end training run with holdout evaluation

pub mod error;
pub mod config;

pub mod features;
pub mod model;
pub mod pipeline;
pub mod artifacts;
pub mod rules;
pub mod synthetic;
pub mod dataset;
pub mod run;
