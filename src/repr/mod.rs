//! Canonical model representation: immutable trees and the additive ensemble.

mod ensemble;
mod tree;

/// Node index within a single tree (0 = root).
pub type NodeId = u32;

pub use ensemble::{Ensemble, EnsembleValidationError};
pub use tree::{Tree, TreeValidationError};
