//! Binary classification metrics computed over host-side slices.

use serde::{Deserialize, Serialize};

const EPS: f64 = 1e-7;

/// Classification metrics
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Metrics {
    /// Binary cross-entropy loss
    pub loss: f64,
    /// Accuracy
    pub accuracy: f64,
    /// Precision
    pub precision: f64,
    /// Recall
    pub recall: f64,
    /// F1 score
    pub f1: f64,
}

/// Compute metrics from predicted probabilities and ground-truth labels.
///
/// Probabilities are thresholded at `threshold` for the counting metrics;
/// the loss is mean BCE over the clamped probabilities.
pub fn classification(probabilities: &[f32], targets: &[u8], threshold: f32) -> Metrics {
    if probabilities.is_empty() || probabilities.len() != targets.len() {
        return Metrics::default();
    }

    let n = probabilities.len() as f64;
    let mut tp = 0u64;
    let mut fp = 0u64;
    let mut tn = 0u64;
    let mut fn_ = 0u64;
    let mut loss = 0.0f64;

    for (&p, &y) in probabilities.iter().zip(targets) {
        let p64 = (p as f64).clamp(EPS, 1.0 - EPS);
        loss -= if y == 1 { p64.ln() } else { (1.0 - p64).ln() };

        let predicted = p >= threshold;
        match (predicted, y == 1) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, false) => tn += 1,
            (false, true) => fn_ += 1,
        }
    }

    let accuracy = (tp + tn) as f64 / n;
    let precision = if tp + fp > 0 {
        tp as f64 / (tp + fp) as f64
    } else {
        0.0
    };
    let recall = if tp + fn_ > 0 {
        tp as f64 / (tp + fn_) as f64
    } else {
        0.0
    };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    Metrics {
        loss: loss / n,
        accuracy,
        precision,
        recall,
        f1,
    }
}
