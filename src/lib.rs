//! treeboost: a batch training pipeline for gradient-boosted binary
//! classifiers.
//!
//! The pipeline reads a CSV feature dataset (last column = 0/1 label), fits
//! an additive ensemble of least-squares regression trees by functional
//! gradient descent on log-loss, and persists the fitted model to a native
//! binary artifact.
//!
//! # Key Types
//!
//! - [`Model`] / [`TrainConfig`] - High-level model with train/predict
//! - [`Dataset`] / [`load_csv`] - Data handling
//! - [`pipeline::train`] - End-to-end load -> fit -> save entry point
//! - [`persist::save`] / [`persist::load`] - Artifact storage
//!
//! # Training
//!
//! ```ignore
//! use treeboost::{Model, TrainConfig};
//!
//! let dataset = treeboost::load_csv("train.csv".as_ref())?;
//! let model = Model::train(&dataset, TrainConfig::default(), 0)?;
//! let probs = model.predict_proba(dataset.features(), 0);
//! ```

pub mod data;
pub mod model;
pub mod persist;
pub mod pipeline;
pub mod repr;
pub mod testing;
pub mod training;
pub mod utils;

// High-level model types
pub use model::{ConfigError, Model, ModelMeta, TrainConfig};

// Data types
pub use data::{load_csv, DataError, Dataset};

// Pipeline entry point and stage-tagged error
pub use pipeline::PipelineError;

// Core representation
pub use repr::{Ensemble, Tree};

// Training types
pub use training::TrainError;

// Shared utilities
pub use utils::{run_with_threads, Parallelism};
