//! Canonical tree representation (SoA).
//!
//! Stores tree nodes in flat parallel arrays for cache-friendly traversal.
//! Trees are built once by the fitter and immutable thereafter; each tree
//! owns its arrays exclusively.

use ndarray::ArrayView1;

use super::NodeId;

/// Structural validation errors for [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeValidationError {
    /// Tree has no nodes.
    EmptyTree,
    /// A child pointer references an out-of-bounds node.
    ChildOutOfBounds {
        node: NodeId,
        side: &'static str,
        child: NodeId,
        n_nodes: usize,
    },
    /// A node references itself as a child.
    SelfLoop { node: NodeId },
    /// A node was reached by more than one path (DAG) or due to a cycle.
    DuplicateVisit { node: NodeId },
    /// A cycle was detected during traversal.
    CycleDetected { node: NodeId },
    /// A node exists in storage but is unreachable from the root.
    UnreachableNode { node: NodeId },
}

/// Structure-of-Arrays regression tree.
///
/// Child indices are local to this tree (0 = root). Split rule: a sample
/// goes left when `value < threshold`, right otherwise. Leaf entries carry
/// the scalar prediction contribution; their split fields hold zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    split_indices: Box<[u32]>,
    split_thresholds: Box<[f64]>,
    left_children: Box<[u32]>,
    right_children: Box<[u32]>,
    is_leaf: Box<[bool]>,
    leaf_values: Box<[f64]>,
}

impl Tree {
    /// Create a new tree from parallel arrays.
    ///
    /// All arrays must have the same length (number of nodes).
    pub fn new(
        split_indices: Vec<u32>,
        split_thresholds: Vec<f64>,
        left_children: Vec<u32>,
        right_children: Vec<u32>,
        is_leaf: Vec<bool>,
        leaf_values: Vec<f64>,
    ) -> Self {
        let n_nodes = split_indices.len();
        debug_assert_eq!(n_nodes, split_thresholds.len());
        debug_assert_eq!(n_nodes, left_children.len());
        debug_assert_eq!(n_nodes, right_children.len());
        debug_assert_eq!(n_nodes, is_leaf.len());
        debug_assert_eq!(n_nodes, leaf_values.len());

        Self {
            split_indices: split_indices.into_boxed_slice(),
            split_thresholds: split_thresholds.into_boxed_slice(),
            left_children: left_children.into_boxed_slice(),
            right_children: right_children.into_boxed_slice(),
            is_leaf: is_leaf.into_boxed_slice(),
            leaf_values: leaf_values.into_boxed_slice(),
        }
    }

    /// Number of nodes in the tree.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.is_leaf.len()
    }

    /// Check if a node is a leaf.
    #[inline]
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.is_leaf[node as usize]
    }

    /// Get the feature index for a split node.
    #[inline]
    pub fn split_index(&self, node: NodeId) -> u32 {
        self.split_indices[node as usize]
    }

    /// Get the split threshold for a split node.
    #[inline]
    pub fn split_threshold(&self, node: NodeId) -> f64 {
        self.split_thresholds[node as usize]
    }

    /// Get the left child node index.
    #[inline]
    pub fn left_child(&self, node: NodeId) -> NodeId {
        self.left_children[node as usize]
    }

    /// Get the right child node index.
    #[inline]
    pub fn right_child(&self, node: NodeId) -> NodeId {
        self.right_children[node as usize]
    }

    /// Get the leaf value at a leaf node.
    #[inline]
    pub fn leaf_value(&self, node: NodeId) -> f64 {
        self.leaf_values[node as usize]
    }

    /// Traverse the tree to find the leaf node for a sample.
    #[inline]
    pub fn traverse_to_leaf(&self, sample: ArrayView1<'_, f64>) -> NodeId {
        let mut node: NodeId = 0;

        while !self.is_leaf(node) {
            let feature = self.split_index(node) as usize;
            node = if sample[feature] < self.split_threshold(node) {
                self.left_child(node)
            } else {
                self.right_child(node)
            };
        }

        node
    }

    /// Predict the contribution for a single sample.
    #[inline]
    pub fn predict_row(&self, sample: ArrayView1<'_, f64>) -> f64 {
        self.leaf_value(self.traverse_to_leaf(sample))
    }

    /// Validate basic structural invariants for this tree.
    ///
    /// Intended for debug checks, tests, and artifact deserialization.
    pub fn validate(&self) -> Result<(), TreeValidationError> {
        let n_nodes = self.n_nodes();
        if n_nodes == 0 {
            return Err(TreeValidationError::EmptyTree);
        }

        // Iterative DFS with color marking.
        // 0 = unvisited, 1 = visiting, 2 = done
        let mut color = vec![0u8; n_nodes];
        let mut stack: Vec<(NodeId, u8)> = vec![(0, 0)];

        while let Some((node, phase)) = stack.pop() {
            let node_usize = node as usize;

            match phase {
                0 => {
                    match color[node_usize] {
                        0 => {}
                        1 => return Err(TreeValidationError::CycleDetected { node }),
                        2 => return Err(TreeValidationError::DuplicateVisit { node }),
                        _ => unreachable!(),
                    }

                    color[node_usize] = 1;
                    stack.push((node, 1));

                    if !self.is_leaf(node) {
                        let left = self.left_child(node);
                        let right = self.right_child(node);

                        if left == node || right == node {
                            return Err(TreeValidationError::SelfLoop { node });
                        }

                        if left as usize >= n_nodes {
                            return Err(TreeValidationError::ChildOutOfBounds {
                                node,
                                side: "left",
                                child: left,
                                n_nodes,
                            });
                        }
                        if right as usize >= n_nodes {
                            return Err(TreeValidationError::ChildOutOfBounds {
                                node,
                                side: "right",
                                child: right,
                                n_nodes,
                            });
                        }

                        stack.push((right, 0));
                        stack.push((left, 0));
                    }
                }
                1 => {
                    color[node_usize] = 2;
                }
                _ => unreachable!(),
            }
        }

        for (i, &c) in color.iter().enumerate() {
            if c == 0 {
                return Err(TreeValidationError::UnreachableNode { node: i as u32 });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    /// root: feat0 < 0.5 -> leaf 1.0 | leaf 2.0
    fn simple_tree() -> Tree {
        Tree::new(
            vec![0, 0, 0],
            vec![0.5, 0.0, 0.0],
            vec![1, 0, 0],
            vec![2, 0, 0],
            vec![false, true, true],
            vec![0.0, 1.0, 2.0],
        )
    }

    #[test]
    fn predict_simple_tree() {
        let tree = simple_tree();
        assert_eq!(tree.predict_row(arr1(&[0.3]).view()), 1.0);
        assert_eq!(tree.predict_row(arr1(&[0.7]).view()), 2.0);
        // Boundary value goes right (rule is value < threshold).
        assert_eq!(tree.predict_row(arr1(&[0.5]).view()), 2.0);
    }

    #[test]
    fn single_leaf_tree() {
        let tree = Tree::new(vec![0], vec![0.0], vec![0], vec![0], vec![true], vec![0.25]);
        assert_eq!(tree.predict_row(arr1(&[123.0]).view()), 0.25);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn validate_accepts_well_formed() {
        assert!(simple_tree().validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_bounds_child() {
        let tree = Tree::new(
            vec![0, 0, 0],
            vec![0.5, 0.0, 0.0],
            vec![1, 0, 0],
            vec![9, 0, 0],
            vec![false, true, true],
            vec![0.0, 1.0, 2.0],
        );
        assert!(matches!(
            tree.validate(),
            Err(TreeValidationError::ChildOutOfBounds { side: "right", child: 9, .. })
        ));
    }

    #[test]
    fn validate_rejects_self_loop() {
        let tree = Tree::new(
            vec![0],
            vec![0.5],
            vec![0],
            vec![0],
            vec![false],
            vec![0.0],
        );
        assert!(matches!(tree.validate(), Err(TreeValidationError::SelfLoop { node: 0 })));
    }

    #[test]
    fn validate_rejects_unreachable_node() {
        // Node 3 exists but nothing points at it.
        let tree = Tree::new(
            vec![0, 0, 0, 0],
            vec![0.5, 0.0, 0.0, 0.0],
            vec![1, 0, 0, 0],
            vec![2, 0, 0, 0],
            vec![false, true, true, true],
            vec![0.0, 1.0, 2.0, 3.0],
        );
        assert!(matches!(
            tree.validate(),
            Err(TreeValidationError::UnreachableNode { node: 3 })
        ));
    }

    #[test]
    fn validate_rejects_shared_child() {
        // Both children of the root point at node 1.
        let tree = Tree::new(
            vec![0, 0],
            vec![0.5, 0.0],
            vec![1, 0],
            vec![1, 0],
            vec![false, true],
            vec![0.0, 1.0],
        );
        assert!(matches!(
            tree.validate(),
            Err(TreeValidationError::DuplicateVisit { node: 1 })
        ));
    }
}
