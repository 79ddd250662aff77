//! Gradient boosting trainer.
//!
//! Orchestrates residual computation, tree fitting, and score updates.
//! Rounds are strictly sequential: round `t + 1` depends on the ensemble
//! state after round `t`. Given identical inputs the output is bit-for-bit
//! reproducible; no randomized subsampling is performed (the seed is carried
//! in the configuration and recorded in the artifact as the documented
//! extension point).

use ndarray::{ArrayView1, ArrayView2};

use crate::repr::Ensemble;
use crate::utils::Parallelism;

use super::fitter::{FitterParams, TreeFitter};
use super::loss::{log_loss, prior_log_odds, sigmoid};
use super::TrainError;

// =============================================================================
// BoostParams
// =============================================================================

/// Parameters for the boosting loop.
#[derive(Debug, Clone)]
pub struct BoostParams {
    /// Number of boosting rounds (trees to train).
    pub n_rounds: usize,
    /// Learning rate (shrinkage).
    pub learning_rate: f64,
    /// Maximum tree depth.
    pub max_depth: usize,
    /// Minimum number of rows a node must keep to be considered for a split.
    pub min_leaf: usize,
}

impl Default for BoostParams {
    fn default() -> Self {
        Self { n_rounds: 100, learning_rate: 0.1, max_depth: 3, min_leaf: 1 }
    }
}

// =============================================================================
// Trainer
// =============================================================================

/// Gradient boosting trainer for binary classification on log-loss.
pub struct Trainer {
    params: BoostParams,
    parallelism: Parallelism,
}

impl Trainer {
    /// Create a new trainer.
    ///
    /// **Note:** This does NOT create a thread pool. The caller sets up
    /// parallelism via [`run_with_threads`](crate::utils::run_with_threads)
    /// if desired.
    pub fn new(params: BoostParams, parallelism: Parallelism) -> Self {
        Self { params, parallelism }
    }

    /// Get reference to parameters.
    pub fn params(&self) -> &BoostParams {
        &self.params
    }

    /// Train an ensemble on `(features, labels)`.
    ///
    /// Labels must be exactly 0.0 or 1.0. A single-class label vector is
    /// accepted: the clamped prior keeps the base score finite and every
    /// round fits a (near-)zero tree, yielding a constant-prediction model.
    pub fn train(
        &self,
        features: ArrayView2<'_, f64>,
        labels: ArrayView1<'_, f64>,
    ) -> Result<Ensemble, TrainError> {
        let n_rows = features.nrows();

        if labels.len() != n_rows {
            return Err(TrainError::InvalidInput {
                reason: format!(
                    "label length {} does not match row count {}",
                    labels.len(),
                    n_rows
                ),
            });
        }
        if n_rows == 0 {
            return Err(TrainError::InvalidInput {
                reason: "feature matrix has no rows".to_string(),
            });
        }
        if features.ncols() == 0 {
            return Err(TrainError::InvalidInput {
                reason: "feature matrix has no columns".to_string(),
            });
        }
        if let Some(bad) = labels.iter().position(|&y| y != 0.0 && y != 1.0) {
            return Err(TrainError::InvalidInput {
                reason: format!("label at row {} is {}, expected 0 or 1", bad, labels[bad]),
            });
        }

        let base_score = prior_log_odds(labels);
        let mut ensemble = Ensemble::new(base_score, self.params.learning_rate);

        let fitter = TreeFitter::new(
            FitterParams { max_depth: self.params.max_depth, min_leaf: self.params.min_leaf },
            self.parallelism,
        );

        let mut scores = vec![base_score; n_rows];
        let mut probabilities = vec![0.0f64; n_rows];
        let mut residuals = vec![0.0f64; n_rows];

        for round in 0..self.params.n_rounds {
            for i in 0..n_rows {
                probabilities[i] = sigmoid(scores[i]);
                residuals[i] = labels[i] - probabilities[i];
            }

            tracing::debug!(
                round,
                train_logloss = log_loss(&probabilities, labels),
                "boosting round"
            );

            let tree = fitter.fit(features, &residuals)?;

            for i in 0..n_rows {
                scores[i] += self.params.learning_rate * tree.predict_row(features.row(i));
            }

            ensemble.push_tree(tree);
        }

        Ok(ensemble)
    }
}
