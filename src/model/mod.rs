//! High-level model: the persisted artifact with train and predict.

mod config;

use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::data::Dataset;
use crate::repr::Ensemble;
use crate::training::{sigmoid, TrainError, Trainer};
use crate::utils::run_with_threads;

pub use config::{ConfigError, TrainConfig};

/// Metadata describing the training context of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    /// Number of input features.
    pub n_features: usize,
    /// Feature names from the dataset header, in column order.
    pub feature_names: Option<Vec<String>>,
}

/// A fitted gradient-boosted binary classifier.
///
/// Holds the ensemble, the configuration it was trained with, and metadata.
/// Prediction is a pure function of the ensemble; nothing is mutated.
pub struct Model {
    ensemble: Ensemble,
    meta: ModelMeta,
    config: TrainConfig,
}

impl Model {
    /// Create a model from all its parts.
    ///
    /// Used when loading from the artifact store; for training new models,
    /// prefer [`Model::train`].
    pub fn from_parts(ensemble: Ensemble, meta: ModelMeta, config: TrainConfig) -> Self {
        Self { ensemble, meta, config }
    }

    /// Train a new model.
    ///
    /// # Arguments
    ///
    /// * `dataset` - Training data (features + 0/1 labels)
    /// * `config` - Training configuration (validated here)
    /// * `n_threads` - Thread count: 0 = auto, 1 = sequential, >1 = exact count
    pub fn train(
        dataset: &Dataset,
        config: TrainConfig,
        n_threads: usize,
    ) -> Result<Self, TrainError> {
        config.validate()?;

        let params = config.to_boost_params();
        let ensemble = run_with_threads(n_threads, |parallelism| {
            Trainer::new(params, parallelism).train(dataset.features(), dataset.labels())
        })?;

        let meta = ModelMeta {
            n_features: dataset.n_features(),
            feature_names: Some(dataset.feature_names().to_vec()),
        };

        Ok(Self { ensemble, meta, config })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get reference to the underlying ensemble.
    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    /// Get reference to model metadata.
    pub fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    /// Get reference to the training configuration.
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Raw margin scores (log-odds scale) for a batch of samples.
    ///
    /// # Panics
    ///
    /// Panics if the feature count does not match the trained model.
    pub fn predict_margin(&self, features: ArrayView2<'_, f64>, n_threads: usize) -> Array1<f64> {
        assert_eq!(
            features.ncols(),
            self.meta.n_features,
            "feature count must match the trained model"
        );

        let mut out = vec![0.0f64; features.nrows()];
        run_with_threads(n_threads, |parallelism| {
            self.ensemble.predict_margin_into(features, &mut out, parallelism);
        });
        Array1::from_vec(out)
    }

    /// Positive-class probabilities for a batch of samples.
    pub fn predict_proba(&self, features: ArrayView2<'_, f64>, n_threads: usize) -> Array1<f64> {
        let mut margins = self.predict_margin(features, n_threads);
        margins.mapv_inplace(sigmoid);
        margins
    }

    /// Class labels for a batch of samples, thresholding probabilities.
    ///
    /// Use `0.5` for the conventional decision boundary.
    pub fn predict(
        &self,
        features: ArrayView2<'_, f64>,
        threshold: f64,
        n_threads: usize,
    ) -> Vec<u8> {
        self.predict_proba(features, n_threads)
            .iter()
            .map(|&p| u8::from(p >= threshold))
            .collect()
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("n_trees", &self.ensemble.n_trees())
            .field("n_features", &self.meta.n_features)
            .field("learning_rate", &self.config.learning_rate)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    fn toy_dataset() -> Dataset {
        Dataset::new(
            arr2(&[[0.0], [1.0], [2.0], [3.0]]),
            arr1(&[0.0, 0.0, 1.0, 1.0]),
            vec!["x0".into()],
        )
    }

    #[test]
    fn train_and_predict() {
        let dataset = toy_dataset();
        let config = TrainConfig { n_estimators: 25, max_depth: 1, ..Default::default() };
        let model = Model::train(&dataset, config, 1).unwrap();

        assert_eq!(model.ensemble().n_trees(), 25);
        assert_eq!(model.meta().n_features, 1);
        assert_eq!(
            model.meta().feature_names.as_deref(),
            Some(&["x0".to_string()][..])
        );

        let probs = model.predict_proba(dataset.features(), 1);
        assert!(probs[0] < 0.5);
        assert!(probs[3] > 0.5);

        let labels = model.predict(dataset.features(), 0.5, 1);
        assert_eq!(labels, vec![0, 0, 1, 1]);
    }

    #[test]
    fn invalid_config_surfaces_before_fitting() {
        let dataset = toy_dataset();
        let config = TrainConfig { learning_rate: 2.0, ..Default::default() };
        let err = Model::train(&dataset, config, 1).unwrap_err();
        assert!(matches!(err, TrainError::InvalidConfig(ConfigError::InvalidLearningRate(_))));
    }

    #[test]
    fn probabilities_match_margins() {
        let dataset = toy_dataset();
        let config = TrainConfig { n_estimators: 5, ..Default::default() };
        let model = Model::train(&dataset, config, 1).unwrap();

        let margins = model.predict_margin(dataset.features(), 1);
        let probs = model.predict_proba(dataset.features(), 1);
        for (m, p) in margins.iter().zip(probs.iter()) {
            assert_eq!(sigmoid(*m), *p);
        }
    }

    #[test]
    #[should_panic(expected = "feature count")]
    fn wrong_width_panics() {
        let dataset = toy_dataset();
        let config = TrainConfig { n_estimators: 1, ..Default::default() };
        let model = Model::train(&dataset, config, 1).unwrap();
        model.predict_proba(arr2(&[[1.0, 2.0]]).view(), 1);
    }
}
