//! In-memory training dataset.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// A fully numeric, complete tabular dataset.
///
/// Rows are samples, columns are features; labels are aligned by row index.
/// Missing values are out of scope: every cell holds a finite `f64`.
#[derive(Debug, Clone)]
pub struct Dataset {
    features: Array2<f64>,
    labels: Array1<f64>,
    feature_names: Vec<String>,
}

impl Dataset {
    /// Create a dataset from its parts.
    ///
    /// `features` is `n_rows x n_features`, `labels` has length `n_rows`,
    /// and `feature_names` has one entry per feature column.
    pub fn new(features: Array2<f64>, labels: Array1<f64>, feature_names: Vec<String>) -> Self {
        debug_assert_eq!(features.nrows(), labels.len());
        debug_assert_eq!(features.ncols(), feature_names.len());
        Self { features, labels, feature_names }
    }

    /// Number of samples.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    /// Number of feature columns.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Read-only view of the feature matrix.
    #[inline]
    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    /// Read-only view of the label vector.
    #[inline]
    pub fn labels(&self) -> ArrayView1<'_, f64> {
        self.labels.view()
    }

    /// Feature column names, in column order.
    #[inline]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn accessors() {
        let dataset = Dataset::new(
            arr2(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]),
            arr1(&[0.0, 1.0, 1.0]),
            vec!["a".into(), "b".into()],
        );

        assert_eq!(dataset.n_rows(), 3);
        assert_eq!(dataset.n_features(), 2);
        assert_eq!(dataset.features()[[1, 0]], 3.0);
        assert_eq!(dataset.labels()[2], 1.0);
        assert_eq!(dataset.feature_names(), &["a".to_string(), "b".to_string()]);
    }
}
