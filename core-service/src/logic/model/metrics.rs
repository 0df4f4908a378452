//! Evaluation metrics (accuracy + per-class report)

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub per_class: BTreeMap<String, ClassMetrics>,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub fn accuracy(y_true: &[String], y_pred: &[String]) -> f64 {
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    ratio(correct, y_true.len())
}

/// Precision/recall/F1 per class over `classes`.
/// Zero division yields 0.
pub fn classification_report(
    classes: &[String],
    y_true: &[String],
    y_pred: &[String],
) -> ClassificationReport {
    let mut per_class = BTreeMap::new();
    let total = y_true.len();

    for class in classes {
        let tp = y_true.iter().zip(y_pred).filter(|(t, p)| *t == class && *p == class).count();
        let predicted = y_pred.iter().filter(|p| *p == class).count();
        let support = y_true.iter().filter(|t| *t == class).count();

        let precision = ratio(tp, predicted);
        let recall = ratio(tp, support);
        let f1_score = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };

        per_class.insert(class.clone(), ClassMetrics { precision, recall, f1_score, support });
    }

    let n = per_class.len().max(1) as f64;
    let macro_avg = ClassMetrics {
        precision: per_class.values().map(|m| m.precision).sum::<f64>() / n,
        recall: per_class.values().map(|m| m.recall).sum::<f64>() / n,
        f1_score: per_class.values().map(|m| m.f1_score).sum::<f64>() / n,
        support: total,
    };

    let weight = |f: fn(&ClassMetrics) -> f64| {
        if total == 0 {
            0.0
        } else {
            per_class.values().map(|m| f(m) * m.support as f64).sum::<f64>() / total as f64
        }
    };
    let weighted_avg = ClassMetrics {
        precision: weight(|m| m.precision),
        recall: weight(|m| m.recall),
        f1_score: weight(|m| m.f1_score),
        support: total,
    };

    ClassificationReport {
        accuracy: accuracy(y_true, y_pred),
        per_class,
        macro_avg,
        weighted_avg,
    }
}
