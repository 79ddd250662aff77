//! Payload structures for the native storage format.
//!
//! These structs are specifically designed for serialization with Postcard.
//! They mirror the runtime types but are kept separate so the storage layout
//! can evolve independently of the in-memory representation.

use serde::{Deserialize, Serialize};

use crate::model::{ModelMeta, TrainConfig};

// ============================================================================
// Top-Level Payload
// ============================================================================

/// Version-tagged payload enum for forward compatibility.
///
/// New format versions add new variants rather than modifying existing ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Payload {
    /// Version 1 payload format.
    V1(PayloadV1),
}

/// Version 1 payload structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadV1 {
    /// Model metadata.
    pub meta: ModelMeta,
    /// Training configuration the model was fitted with.
    pub config: TrainConfig,
    /// The fitted ensemble.
    pub ensemble: EnsemblePayload,
}

// ============================================================================
// Ensemble / Tree Payloads
// ============================================================================

/// Additive tree ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsemblePayload {
    /// Log-odds base prediction.
    pub base_score: f64,
    /// Learning rate applied to tree contributions.
    pub shrinkage: f64,
    /// Trees in boosting order.
    pub trees: Vec<TreePayload>,
}

/// Single decision tree payload (SoA layout).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreePayload {
    /// Number of nodes.
    pub num_nodes: u32,
    /// Split feature indices (one per node, 0 for leaves).
    pub split_indices: Vec<u32>,
    /// Split thresholds (one per node, 0.0 for leaves).
    pub split_thresholds: Vec<f64>,
    /// Left child indices (one per node, 0 for leaves).
    pub left_children: Vec<u32>,
    /// Right child indices (one per node, 0 for leaves).
    pub right_children: Vec<u32>,
    /// Whether each node is a leaf.
    pub is_leaf: Vec<bool>,
    /// Leaf values (one per node, 0.0 for internal nodes).
    pub leaf_values: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_roundtrips_through_postcard() {
        let payload = Payload::V1(PayloadV1 {
            meta: ModelMeta { n_features: 2, feature_names: Some(vec!["a".into(), "b".into()]) },
            config: TrainConfig::default(),
            ensemble: EnsemblePayload {
                base_score: -0.25,
                shrinkage: 0.1,
                trees: vec![TreePayload {
                    num_nodes: 3,
                    split_indices: vec![0, 0, 0],
                    split_thresholds: vec![0.5, 0.0, 0.0],
                    left_children: vec![1, 0, 0],
                    right_children: vec![2, 0, 0],
                    is_leaf: vec![false, true, true],
                    leaf_values: vec![0.0, -1.0, 1.0],
                }],
            },
        });

        let bytes = postcard::to_allocvec(&payload).unwrap();
        assert!(!bytes.is_empty());

        let decoded: Payload = postcard::from_bytes(&bytes).unwrap();
        let Payload::V1(v1) = decoded;
        assert_eq!(v1.meta.n_features, 2);
        assert_eq!(v1.ensemble.trees.len(), 1);
        assert_eq!(v1.ensemble.trees[0].leaf_values, vec![0.0, -1.0, 1.0]);
    }
}
