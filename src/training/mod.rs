//! Training infrastructure: loss primitives, the regression tree fitter,
//! and the gradient boosting loop.

mod fitter;
mod loss;
mod trainer;

use thiserror::Error;

use crate::model::ConfigError;

pub use fitter::{FitterParams, TreeFitter};
pub use loss::{log_loss, prior_log_odds, sigmoid};
pub use trainer::{BoostParams, Trainer};

/// Errors raised during training.
///
/// None of these are recovered internally: a failed round aborts the run,
/// and re-invocation with the same inputs produces the same error.
#[derive(Debug, Error)]
pub enum TrainError {
    /// Configuration rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Malformed inputs: shape mismatch, empty matrix, non-binary labels.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Should-never-happen condition indicating a fitter bug.
    #[error("internal invariant violated: {reason}")]
    Invariant { reason: String },
}
