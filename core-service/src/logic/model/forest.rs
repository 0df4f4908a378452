//! Random Forest - bagged CART trees with per-split feature sampling

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SEED;
use crate::logic::error::{PipelineError, PipelineResult};
use super::tree::{DecisionTree, TreeParams};

// ============================================================================
// PARAMETERS
// ============================================================================

/// Candidate features considered at each split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    Sqrt,
    All,
    Count(usize),
}

impl MaxFeatures {
    pub fn resolve(&self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Count(k) => *k,
        };
        k.clamp(1, n_features.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// None grows until leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: DEFAULT_SEED,
        }
    }
}

// ============================================================================
// FOREST
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit on a dense matrix. `labels[i]` is a class index in `0..n_classes`.
    pub fn fit(
        x: &Array2<f64>,
        labels: &[usize],
        n_classes: usize,
        params: &ForestParams,
    ) -> PipelineResult<Self> {
        let n_rows = x.nrows();
        if n_rows == 0 {
            return Err(PipelineError::data("cannot fit a forest on zero rows"));
        }
        if n_rows != labels.len() {
            return Err(PipelineError::data(format!(
                "feature matrix has {} rows but {} labels were given",
                n_rows,
                labels.len()
            )));
        }
        if n_classes < 2 {
            return Err(PipelineError::data("at least two classes are required"));
        }
        if let Some(bad) = labels.iter().find(|&&l| l >= n_classes) {
            return Err(PipelineError::data(format!("label index {} out of range", bad)));
        }
        if params.n_estimators == 0 {
            return Err(PipelineError::data("n_estimators must be at least 1"));
        }

        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split.max(2),
            min_samples_leaf: params.min_samples_leaf.max(1),
            max_features: params.max_features.resolve(x.ncols()),
        };

        log::debug!(
            "Fitting {} trees on {}x{} matrix ({} classes, {} features per split)",
            params.n_estimators,
            n_rows,
            x.ncols(),
            n_classes,
            tree_params.max_features
        );

        let all_rows: Vec<usize> = (0..n_rows).collect();
        let trees = (0..params.n_estimators)
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(i as u64));
                let samples: Vec<usize> = if params.bootstrap {
                    (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect()
                } else {
                    all_rows.clone()
                };
                DecisionTree::fit(x, labels, &samples, n_classes, &tree_params, &mut rng)
            })
            .collect();

        Ok(Self {
            n_features: x.ncols(),
            n_classes,
            trees,
        })
    }

    /// Mean of the leaf distributions across trees
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (p, d) in proba.iter_mut().zip(tree.predict_distribution(row)) {
                *p += d;
            }
        }

        let n = self.trees.len().max(1) as f64;
        proba.iter_mut().for_each(|p| *p /= n);
        proba
    }

    /// Most probable class index and its probability.
    /// Ties go to the lowest class index.
    pub fn predict(&self, row: &[f64]) -> (usize, f64) {
        argmax(&self.predict_proba(row))
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// First index holding the maximum value
pub fn argmax(values: &[f64]) -> (usize, f64) {
    values
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, v)| if v > best.1 { (i, v) } else { best })
}
