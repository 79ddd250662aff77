//! End-to-end training pipeline: load -> fit -> save.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::data::{self, DataError};
use crate::model::{Model, TrainConfig};
use crate::persist::{self, SaveError};
use crate::training::TrainError;

/// Pipeline failure, tagged with the stage it arose in.
///
/// Nothing is recovered or retried: a single deterministic pass either
/// succeeds or fails, and re-invocation with the same inputs produces the
/// same error.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The dataset could not be loaded.
    #[error("failed to load dataset from {path}")]
    Load {
        path: PathBuf,
        #[source]
        source: DataError,
    },

    /// Training aborted (invalid config, malformed shapes, or a fitter bug).
    #[error("training failed")]
    Fit(#[from] TrainError),

    /// The fitted model could not be written.
    #[error("failed to save model to {path}")]
    Save {
        path: PathBuf,
        #[source]
        source: SaveError,
    },
}

/// Run the full pipeline: read `dataset_path`, fit a model with `config`,
/// write the artifact to `output_path`.
///
/// `n_threads`: 0 = auto, 1 = sequential, >1 = exact count.
pub fn train(
    dataset_path: &Path,
    output_path: &Path,
    config: &TrainConfig,
    n_threads: usize,
) -> Result<(), PipelineError> {
    let dataset = data::load_csv(dataset_path).map_err(|source| PipelineError::Load {
        path: dataset_path.to_path_buf(),
        source,
    })?;
    tracing::info!(
        path = %dataset_path.display(),
        n_rows = dataset.n_rows(),
        n_features = dataset.n_features(),
        "dataset loaded"
    );

    let model = Model::train(&dataset, config.clone(), n_threads)?;
    tracing::info!(n_trees = model.ensemble().n_trees(), "model training completed");

    persist::save(&model, output_path).map_err(|source| PipelineError::Save {
        path: output_path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %output_path.display(), "model saved");

    Ok(())
}
