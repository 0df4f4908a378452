//! CART classification tree (Gini impurity)

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};

// ============================================================================
// NODES
// ============================================================================

/// A node in a decision tree. Children are indices into `DecisionTree::nodes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Go left if `row[feature] < threshold`
    Split {
        feature: u32,
        threshold: f64,
        left: u32,
        right: u32,
    },
    /// Class probability distribution of the training samples that reached it
    Leaf { distribution: Vec<f64> },
}

impl Node {
    fn leaf(counts: &[usize]) -> Self {
        let total: usize = counts.iter().sum();
        let distribution = if total == 0 {
            vec![1.0 / counts.len() as f64; counts.len()]
        } else {
            counts.iter().map(|&c| c as f64 / total as f64).collect()
        };
        Node::Leaf { distribution }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

// ============================================================================
// PARAMETERS
// ============================================================================

/// Growth limits for a single tree
#[derive(Debug, Clone)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Candidate features drawn per split
    pub max_features: usize,
}

// ============================================================================
// TREE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Grow a tree on the rows listed in `samples` (duplicates allowed).
    pub fn fit(
        x: &Array2<f64>,
        y: &[usize],
        samples: &[usize],
        n_classes: usize,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut grower = Grower {
            x,
            y,
            n_classes,
            params,
            nodes: Vec::new(),
        };
        let mut samples = samples.to_vec();
        grower.grow(&mut samples, 0, rng);

        Self { nodes: grower.nodes }
    }

    /// Leaf distribution reached by `row`. Missing features read as 0.
    pub fn predict_distribution(&self, row: &[f64]) -> &[f64] {
        let mut index = 0usize;
        loop {
            match &self.nodes[index] {
                Node::Split { feature, threshold, left, right } => {
                    let value = row.get(*feature as usize).copied().unwrap_or(0.0);
                    let next = if value < *threshold { *left } else { *right };
                    index = next as usize;
                }
                Node::Leaf { distribution } => return distribution,
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match &nodes[index] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => {
                    1 + walk(nodes, *left as usize).max(walk(nodes, *right as usize))
                }
            }
        }
        walk(&self.nodes, 0)
    }
}

// ============================================================================
// GROWER
// ============================================================================

struct Grower<'a> {
    x: &'a Array2<f64>,
    y: &'a [usize],
    n_classes: usize,
    params: &'a TreeParams,
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / total).powi(2)).sum::<f64>()
}

impl<'a> Grower<'a> {
    fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &s in samples {
            counts[self.y[s]] += 1;
        }
        counts
    }

    fn grow(&mut self, samples: &mut [usize], depth: usize, rng: &mut StdRng) -> u32 {
        let id = self.nodes.len() as u32;
        let counts = self.class_counts(samples);
        let n = samples.len();

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let too_deep = self.params.max_depth.map_or(false, |d| depth >= d);
        let too_small = n < self.params.min_samples_split || n < 2 * self.params.min_samples_leaf;

        if pure || too_deep || too_small {
            self.nodes.push(Node::leaf(&counts));
            return id;
        }

        let split = match self.best_split(samples, rng) {
            Some(split) => split,
            None => {
                self.nodes.push(Node::leaf(&counts));
                return id;
            }
        };

        // Reserve the slot; children are appended after it
        self.nodes.push(Node::leaf(&counts));

        let x = self.x;
        samples.sort_by_key(|&s| x[[s, split.feature]] >= split.threshold);
        let mid = samples
            .iter()
            .position(|&s| x[[s, split.feature]] >= split.threshold)
            .unwrap_or(samples.len());

        let (left_samples, right_samples) = samples.split_at_mut(mid);
        let left = self.grow(left_samples, depth + 1, rng);
        let right = self.grow(right_samples, depth + 1, rng);

        self.nodes[id as usize] = Node::Split {
            feature: split.feature as u32,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn best_split(&self, samples: &[usize], rng: &mut StdRng) -> Option<SplitCandidate> {
        let n_features = self.x.ncols();
        let k = self.params.max_features.clamp(1, n_features.max(1));
        if n_features == 0 {
            return None;
        }

        let n = samples.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let mut best: Option<SplitCandidate> = None;
        let mut pairs: Vec<(f64, usize)> = Vec::with_capacity(n);

        for feature in sample(rng, n_features, k).into_iter() {
            pairs.clear();
            pairs.extend(samples.iter().map(|&s| (self.x[[s, feature]], self.y[s])));
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            if pairs[0].0 == pairs[n - 1].0 {
                continue; // constant feature in this node
            }

            let mut left_counts = vec![0usize; self.n_classes];
            let mut right_counts = vec![0usize; self.n_classes];
            for &(_, class) in &pairs {
                right_counts[class] += 1;
            }

            for i in 0..n - 1 {
                let class = pairs[i].1;
                left_counts[class] += 1;
                right_counts[class] -= 1;

                let (current, next) = (pairs[i].0, pairs[i + 1].0);
                let n_left = i + 1;
                let n_right = n - n_left;
                if current == next || n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let impurity = (n_left as f64 * gini(&left_counts, n_left)
                    + n_right as f64 * gini(&right_counts, n_right))
                    / n as f64;

                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    let mut threshold = current + (next - current) / 2.0;
                    if threshold <= current {
                        threshold = next;
                    }
                    best = Some(SplitCandidate { feature, threshold, impurity });
                }
            }
        }

        best
    }
}
