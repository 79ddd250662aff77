//! Additive ensemble of regression trees.

use ndarray::{ArrayView1, ArrayView2};
use rayon::prelude::*;

use crate::utils::Parallelism;

use super::tree::TreeValidationError;
use super::Tree;

/// Structural validation errors for [`Ensemble`].
#[derive(Debug, Clone, PartialEq)]
pub enum EnsembleValidationError {
    /// Base score or shrinkage is not a finite number.
    NonFiniteParameter { field: &'static str, value: f64 },
    /// A member tree failed structural validation.
    InvalidTree { tree_idx: usize, error: TreeValidationError },
}

/// Ordered sequence of trees plus the base prediction.
///
/// The raw margin for a sample is
/// `base_score + shrinkage * sum(tree_i(x))`. Trees are appended one per
/// boosting round by the single writer (the trainer) and the ensemble is
/// read-only once training returns. A partially built ensemble (rounds
/// `1..t`) is itself a valid model.
#[derive(Debug, Clone, PartialEq)]
pub struct Ensemble {
    trees: Vec<Tree>,
    base_score: f64,
    shrinkage: f64,
}

impl Ensemble {
    /// Create an empty ensemble.
    ///
    /// `base_score` is the log-odds of the positive-class prior;
    /// `shrinkage` is the learning rate applied to every tree contribution.
    pub fn new(base_score: f64, shrinkage: f64) -> Self {
        Self { trees: Vec::new(), base_score, shrinkage }
    }

    /// Append a fitted tree.
    pub fn push_tree(&mut self, tree: Tree) {
        self.trees.push(tree);
    }

    /// Number of trees.
    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Log-odds base prediction.
    #[inline]
    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    /// Learning rate applied to tree contributions.
    #[inline]
    pub fn shrinkage(&self) -> f64 {
        self.shrinkage
    }

    /// Get a reference to a specific tree.
    #[inline]
    pub fn tree(&self, idx: usize) -> &Tree {
        &self.trees[idx]
    }

    /// Iterate over trees.
    pub fn trees(&self) -> impl Iterator<Item = &Tree> {
        self.trees.iter()
    }

    /// Raw margin score for a single sample.
    #[inline]
    pub fn margin_row(&self, sample: ArrayView1<'_, f64>) -> f64 {
        let sum: f64 = self.trees.iter().map(|tree| tree.predict_row(sample)).sum();
        self.base_score + self.shrinkage * sum
    }

    /// Compute raw margin scores for a batch of samples.
    ///
    /// `out` must be pre-allocated with length `features.nrows()`; each
    /// entry is overwritten.
    pub fn predict_margin_into(
        &self,
        features: ArrayView2<'_, f64>,
        out: &mut [f64],
        parallelism: Parallelism,
    ) {
        let n_rows = features.nrows();
        assert_eq!(out.len(), n_rows, "output buffer must have length n_rows");

        if parallelism.is_parallel() {
            out.par_iter_mut()
                .enumerate()
                .for_each(|(row, slot)| *slot = self.margin_row(features.row(row)));
        } else {
            out.iter_mut()
                .enumerate()
                .for_each(|(row, slot)| *slot = self.margin_row(features.row(row)));
        }
    }

    /// Validate structural invariants for the ensemble and every tree.
    ///
    /// Intended for artifact deserialization and tests.
    pub fn validate(&self) -> Result<(), EnsembleValidationError> {
        if !self.base_score.is_finite() {
            return Err(EnsembleValidationError::NonFiniteParameter {
                field: "base_score",
                value: self.base_score,
            });
        }
        if !self.shrinkage.is_finite() {
            return Err(EnsembleValidationError::NonFiniteParameter {
                field: "shrinkage",
                value: self.shrinkage,
            });
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|error| EnsembleValidationError::InvalidTree { tree_idx: i, error })?;
        }

        Ok(())
    }
}
