//! Deterministic synthetic data helpers for tests and benches.

use ndarray::{Array1, Array2};
use rand::prelude::*;

use crate::data::Dataset;

/// Generate random dense features, uniform in `[min, max]`.
pub fn random_features(rows: usize, cols: usize, seed: u64, min: f64, max: f64) -> Array2<f64> {
    assert!(max >= min);
    let mut rng = StdRng::seed_from_u64(seed);
    let width = max - min;
    Array2::from_shape_fn((rows, cols), |_| min + rng.gen::<f64>() * width)
}

/// Generate a binary classification dataset with a linear decision boundary.
///
/// Labels are 1 where a random (seeded) linear score of the features plus
/// noise is positive. Feature names are `f0..fN`.
pub fn synthetic_binary(rows: usize, cols: usize, seed: u64) -> Dataset {
    let features = random_features(rows, cols, seed, -1.0, 1.0);

    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    let weights: Vec<f64> = (0..cols).map(|_| rng.gen::<f64>() * 2.0 - 1.0).collect();
    let bias: f64 = rng.gen::<f64>() * 0.5 - 0.25;

    let labels = Array1::from_iter((0..rows).map(|r| {
        let mut score = bias;
        for c in 0..cols {
            score += features[[r, c]] * weights[c];
        }
        score += (rng.gen::<f64>() * 2.0 - 1.0) * 0.05;
        if score > 0.0 {
            1.0
        } else {
            0.0
        }
    }));

    let feature_names = (0..cols).map(|c| format!("f{c}")).collect();
    Dataset::new(features, labels, feature_names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_seeded() {
        let a = synthetic_binary(50, 3, 7);
        let b = synthetic_binary(50, 3, 7);
        assert_eq!(a.features(), b.features());
        assert_eq!(a.labels(), b.labels());

        let c = synthetic_binary(50, 3, 8);
        assert_ne!(a.features(), c.features());
    }

    #[test]
    fn labels_are_binary_and_mixed() {
        let dataset = synthetic_binary(200, 4, 42);
        let positives = dataset.labels().iter().filter(|&&y| y == 1.0).count();
        assert!(dataset.labels().iter().all(|&y| y == 0.0 || y == 1.0));
        // A linear boundary over uniform features should produce both classes.
        assert!(positives > 0 && positives < 200);
    }
}
