//! Logistic loss primitives.
//!
//! All arithmetic is double precision. Scores are clamped before
//! exponentiation so large margins cannot overflow.

use ndarray::ArrayView1;

/// Scores are clamped to this magnitude before exponentiation.
/// `exp(34)` is ~5.8e14, far from f64 overflow, and `sigmoid(±34)` is
/// already indistinguishable from 0/1 at f64 resolution.
const SCORE_CLAMP: f64 = 34.0;

/// Class priors are clamped away from 0 and 1 so the log-odds stay finite
/// on single-class label sets.
const PRIOR_EPS: f64 = 1e-7;

/// Probability clamp used by the log-loss metric.
const LOSS_EPS: f64 = 1e-15;

/// Numerically stabilized logistic function.
#[inline]
pub fn sigmoid(score: f64) -> f64 {
    let s = score.clamp(-SCORE_CLAMP, SCORE_CLAMP);
    1.0 / (1.0 + (-s).exp())
}

/// Log-odds of the positive-class prior: `ln(p / (1 - p))` with `p`
/// clamped to `[PRIOR_EPS, 1 - PRIOR_EPS]`.
///
/// The clamp keeps the base score finite for all-zero or all-one label
/// vectors, which degenerate to a constant-prediction model.
pub fn prior_log_odds(labels: ArrayView1<'_, f64>) -> f64 {
    let p = labels.mean().unwrap_or(0.5).clamp(PRIOR_EPS, 1.0 - PRIOR_EPS);
    (p / (1.0 - p)).ln()
}

/// Binary cross-entropy: `-mean(y*ln(p) + (1-y)*ln(1-p))`.
///
/// Lower is better. Expects probabilities; clamps them away from 0 and 1.
pub fn log_loss(probabilities: &[f64], labels: ArrayView1<'_, f64>) -> f64 {
    debug_assert_eq!(probabilities.len(), labels.len());
    if probabilities.is_empty() {
        return 0.0;
    }

    let sum: f64 = probabilities
        .iter()
        .zip(labels.iter())
        .map(|(&p, &y)| {
            let p = p.clamp(LOSS_EPS, 1.0 - LOSS_EPS);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();

    sum / probabilities.len() as f64
}
