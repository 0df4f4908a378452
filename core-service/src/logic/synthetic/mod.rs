//! Synthetic Module - labeled training data per theme
//!
//! ## Structure
//! - `sampling.rs` - Distribution helpers
//! - `flows.rs` - Network flows (normal / scan / dos)
//! - `iam.rs` - IAM policy findings (low .. critical)
//! - `process.rs` - Process snapshots (benign + malware families)
//! - `graph.rs` - AD graph nodes (low_risk / high_risk)
//!
//! Every generator is deterministic for a given seed.

pub mod sampling;
pub mod flows;
pub mod iam;
pub mod process;
pub mod graph;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::logic::features::derivers::{FlowDeriver, GraphDeriver, IamDeriver, ProcessDeriver};
use crate::logic::features::{FeatureBuilder, FeatureDeriver, RawRecord};

pub use flows::FlowGenerator;
pub use graph::GraphGenerator;
pub use iam::IamGenerator;
pub use process::ProcessGenerator;

/// Produces labeled raw records
pub trait DatasetGenerator {
    fn name(&self) -> &'static str;

    fn generate(&self, n: usize, rng: &mut StdRng) -> Vec<RawRecord>;
}

/// Data domain: selects the generator and the matching deriver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Flows,
    Iam,
    Process,
    Graph,
}

impl Theme {
    pub fn all() -> &'static [Theme] {
        &[Theme::Flows, Theme::Iam, Theme::Process, Theme::Graph]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Flows => "flows",
            Theme::Iam => "iam",
            Theme::Process => "process",
            Theme::Graph => "graph",
        }
    }

    pub fn generator(&self) -> Box<dyn DatasetGenerator> {
        match self {
            Theme::Flows => Box::new(FlowGenerator),
            Theme::Iam => Box::new(IamGenerator),
            Theme::Process => Box::new(ProcessGenerator),
            Theme::Graph => Box::new(GraphGenerator),
        }
    }

    pub fn deriver(&self) -> Arc<dyn FeatureDeriver> {
        match self {
            Theme::Flows => Arc::new(FlowDeriver),
            Theme::Iam => Arc::new(IamDeriver),
            Theme::Process => Arc::new(ProcessDeriver),
            Theme::Graph => Arc::new(GraphDeriver),
        }
    }

    /// Builder used for both training and inference of this theme
    pub fn builder(&self, label_field: &str) -> FeatureBuilder {
        FeatureBuilder::new(self.deriver()).with_label_field(label_field)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Theme::all()
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = Theme::all().iter().map(|t| t.as_str()).collect();
                format!("unknown theme '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

/// Generate `n` labeled rows for a theme with a fixed seed
pub fn generate(theme: Theme, n: usize, seed: u64) -> Vec<RawRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows = theme.generator().generate(n, &mut rng);
    log::debug!("Generated {} {} rows (seed={})", rows.len(), theme, seed);
    rows
}
