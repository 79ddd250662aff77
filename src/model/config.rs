//! Training configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::training::BoostParams;

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Learning rate must be in (0, 1].
    #[error("learning_rate must be in (0, 1], got {0}")]
    InvalidLearningRate(f64),
    /// Tree depth must be at least 1.
    #[error("max_depth must be at least 1")]
    InvalidMaxDepth,
    /// Number of boosting rounds must be at least 1.
    #[error("n_estimators must be at least 1")]
    InvalidNEstimators,
    /// Minimum leaf size must be at least 1.
    #[error("min_leaf must be at least 1")]
    InvalidMinLeaf,
}

/// Configuration for one training run.
///
/// Defaults mirror the pipeline's production settings: 100 rounds of
/// depth-3 trees at learning rate 0.1, seed 42.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Learning rate (shrinkage), in (0, 1].
    pub learning_rate: f64,
    /// Maximum tree depth; 1 produces decision stumps.
    pub max_depth: usize,
    /// Number of boosting rounds (trees to train).
    pub n_estimators: usize,
    /// Minimum number of rows a node must keep to be considered for a split.
    pub min_leaf: usize,
    /// Random seed, recorded in the artifact. The deterministic pipeline
    /// performs no subsampling; the seed is the extension point for it.
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self { learning_rate: 0.1, max_depth: 3, n_estimators: 100, min_leaf: 1, seed: 42 }
    }
}

impl TrainConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.learning_rate.is_finite()
            || self.learning_rate <= 0.0
            || self.learning_rate > 1.0
        {
            return Err(ConfigError::InvalidLearningRate(self.learning_rate));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidMaxDepth);
        }
        if self.n_estimators == 0 {
            return Err(ConfigError::InvalidNEstimators);
        }
        if self.min_leaf == 0 {
            return Err(ConfigError::InvalidMinLeaf);
        }
        Ok(())
    }

    /// Convert to boosting-loop parameters.
    pub(crate) fn to_boost_params(&self) -> BoostParams {
        BoostParams {
            n_rounds: self.n_estimators,
            learning_rate: self.learning_rate,
            max_depth: self.max_depth,
            min_leaf: self.min_leaf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = TrainConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.n_estimators, 100);
        assert_eq!(config.max_depth, 3);
        assert!((config.learning_rate - 0.1).abs() < 1e-12);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn learning_rate_bounds() {
        let mut config = TrainConfig { learning_rate: 0.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLearningRate(_))));

        config.learning_rate = -0.1;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLearningRate(_))));

        config.learning_rate = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLearningRate(_))));

        config.learning_rate = f64::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLearningRate(_))));

        config.learning_rate = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_counts_rejected() {
        let config = TrainConfig { max_depth: 0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::InvalidMaxDepth));

        let config = TrainConfig { n_estimators: 0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::InvalidNEstimators));

        let config = TrainConfig { min_leaf: 0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::InvalidMinLeaf));
    }
}
