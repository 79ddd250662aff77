//! Native binary artifact storage.
//!
//! The on-disk format is a 32-byte header followed by a Postcard-encoded
//! payload:
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       4     Magic ("GBCM")
//! 4       1     Version major
//! 5       1     Version minor
//! 6       2     Reserved
//! 8       4     Payload size (bytes)
//! 12      4     CRC32 checksum of payload
//! 16      4     Number of features
//! 20      4     Number of trees
//! 24      8     Reserved
//! ```
//!
//! The artifact is private to this pipeline: the payload enum is version
//! tagged so readers can reject formats they do not understand, and the
//! checksum plus structural validation catch corrupted files.

mod payload;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use thiserror::Error;

use crate::model::Model;
use crate::repr::{Ensemble, Tree};

pub use payload::{EnsemblePayload, Payload, PayloadV1, TreePayload};

// ============================================================================
// Constants
// ============================================================================

/// Magic bytes identifying a model artifact.
pub const MAGIC: &[u8; 4] = b"GBCM";

/// Current format version (major).
pub const CURRENT_VERSION_MAJOR: u8 = 1;

/// Current format version (minor).
pub const CURRENT_VERSION_MINOR: u8 = 0;

/// Size of the format header in bytes.
pub const HEADER_SIZE: usize = 32;

// ============================================================================
// Format Header
// ============================================================================

/// 32-byte header for the native storage format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatHeader {
    /// Format version (major).
    pub version_major: u8,
    /// Format version (minor).
    pub version_minor: u8,
    /// Size of the payload in bytes.
    pub payload_size: u32,
    /// CRC32 checksum of the payload.
    pub checksum: u32,
    /// Number of input features.
    pub n_features: u32,
    /// Number of trees in the ensemble.
    pub n_trees: u32,
}

impl FormatHeader {
    /// Create a new header with the current version.
    pub fn new(n_features: u32, n_trees: u32) -> Self {
        Self {
            version_major: CURRENT_VERSION_MAJOR,
            version_minor: CURRENT_VERSION_MINOR,
            payload_size: 0,
            checksum: 0,
            n_features,
            n_trees,
        }
    }

    /// Serialize header to 32 bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];

        buf[0..4].copy_from_slice(MAGIC);
        buf[4] = self.version_major;
        buf[5] = self.version_minor;
        // Bytes 6-7 reserved.
        buf[8..12].copy_from_slice(&self.payload_size.to_le_bytes());
        buf[12..16].copy_from_slice(&self.checksum.to_le_bytes());
        buf[16..20].copy_from_slice(&self.n_features.to_le_bytes());
        buf[20..24].copy_from_slice(&self.n_trees.to_le_bytes());
        // Bytes 24-31 reserved.

        buf
    }

    /// Parse header from 32 bytes.
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self, LoadError> {
        if &buf[0..4] != MAGIC {
            return Err(LoadError::NotAModel);
        }

        let version_major = buf[4];
        let version_minor = buf[5];
        if version_major > CURRENT_VERSION_MAJOR {
            return Err(LoadError::UnsupportedVersion {
                major: version_major,
                minor: version_minor,
            });
        }

        let payload_size = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
        let checksum = u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]);
        let n_features = u32::from_le_bytes([buf[16], buf[17], buf[18], buf[19]]);
        let n_trees = u32::from_le_bytes([buf[20], buf[21], buf[22], buf[23]]);

        Ok(Self {
            version_major,
            version_minor,
            payload_size,
            checksum,
            n_features,
            n_trees,
        })
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while saving an artifact.
#[derive(Debug, Error)]
pub enum SaveError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Postcard encoding error.
    #[error("encoding error: {0}")]
    Encoding(#[from] postcard::Error),
}

/// Errors that can occur while loading an artifact.
#[derive(Debug, Error)]
pub enum LoadError {
    /// File is not a model artifact (wrong magic).
    #[error("not a model artifact")]
    NotAModel,

    /// Artifact requires a newer reader.
    #[error("artifact requires format version {major}.{minor} or later")]
    UnsupportedVersion { major: u8, minor: u8 },

    /// Payload checksum doesn't match.
    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// File was truncated or incomplete.
    #[error("file truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Payload is corrupt or malformed.
    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    /// I/O error during reading.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Postcard decoding error.
    #[error("decoding error: {0}")]
    Decoding(#[from] postcard::Error),
}

// ============================================================================
// CRC32 Helper
// ============================================================================

/// Compute CRC32 checksum of data.
pub fn compute_checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

// ============================================================================
// Codec
// ============================================================================

/// Write header and payload to a writer.
pub fn write_to<W: Write>(
    writer: &mut W,
    header: &mut FormatHeader,
    payload: &[u8],
) -> Result<(), SaveError> {
    header.payload_size = payload.len() as u32;
    header.checksum = compute_checksum(payload);

    writer.write_all(&header.to_bytes())?;
    writer.write_all(payload)?;

    Ok(())
}

/// Read header and payload from a reader, verifying the checksum.
pub fn read_from<R: Read>(reader: &mut R) -> Result<(FormatHeader, Vec<u8>), LoadError> {
    let mut header_buf = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header_buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            LoadError::Truncated { expected: HEADER_SIZE, actual: 0 }
        } else {
            LoadError::Io(e)
        }
    })?;

    let header = FormatHeader::from_bytes(&header_buf)?;

    let mut payload = vec![0u8; header.payload_size as usize];
    reader.read_exact(&mut payload).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            LoadError::Truncated {
                expected: header.payload_size as usize,
                actual: payload.len(),
            }
        } else {
            LoadError::Io(e)
        }
    })?;

    let actual_checksum = compute_checksum(&payload);
    if actual_checksum != header.checksum {
        return Err(LoadError::ChecksumMismatch {
            expected: header.checksum,
            actual: actual_checksum,
        });
    }

    Ok((header, payload))
}

// ============================================================================
// Model <-> Payload Conversion
// ============================================================================

fn tree_to_payload(tree: &Tree) -> TreePayload {
    let n_nodes = tree.n_nodes();
    let mut payload = TreePayload {
        num_nodes: n_nodes as u32,
        split_indices: Vec::with_capacity(n_nodes),
        split_thresholds: Vec::with_capacity(n_nodes),
        left_children: Vec::with_capacity(n_nodes),
        right_children: Vec::with_capacity(n_nodes),
        is_leaf: Vec::with_capacity(n_nodes),
        leaf_values: Vec::with_capacity(n_nodes),
    };

    for node in 0..n_nodes as u32 {
        payload.split_indices.push(tree.split_index(node));
        payload.split_thresholds.push(tree.split_threshold(node));
        payload.left_children.push(tree.left_child(node));
        payload.right_children.push(tree.right_child(node));
        payload.is_leaf.push(tree.is_leaf(node));
        payload.leaf_values.push(tree.leaf_value(node));
    }

    payload
}

fn tree_from_payload(idx: usize, payload: TreePayload) -> Result<Tree, LoadError> {
    let n_nodes = payload.num_nodes as usize;
    let lengths = [
        payload.split_indices.len(),
        payload.split_thresholds.len(),
        payload.left_children.len(),
        payload.right_children.len(),
        payload.is_leaf.len(),
        payload.leaf_values.len(),
    ];
    if lengths.iter().any(|&len| len != n_nodes) {
        return Err(LoadError::CorruptPayload(format!(
            "tree {idx}: node array lengths {lengths:?} do not match num_nodes {n_nodes}"
        )));
    }

    Ok(Tree::new(
        payload.split_indices,
        payload.split_thresholds,
        payload.left_children,
        payload.right_children,
        payload.is_leaf,
        payload.leaf_values,
    ))
}

fn model_to_payload(model: &Model) -> PayloadV1 {
    let ensemble = model.ensemble();
    PayloadV1 {
        meta: model.meta().clone(),
        config: model.config().clone(),
        ensemble: EnsemblePayload {
            base_score: ensemble.base_score(),
            shrinkage: ensemble.shrinkage(),
            trees: ensemble.trees().map(tree_to_payload).collect(),
        },
    }
}

fn model_from_payload(payload: PayloadV1) -> Result<Model, LoadError> {
    let mut ensemble = Ensemble::new(payload.ensemble.base_score, payload.ensemble.shrinkage);
    for (idx, tree_payload) in payload.ensemble.trees.into_iter().enumerate() {
        ensemble.push_tree(tree_from_payload(idx, tree_payload)?);
    }

    ensemble
        .validate()
        .map_err(|e| LoadError::CorruptPayload(format!("{e:?}")))?;

    Ok(Model::from_parts(ensemble, payload.meta, payload.config))
}

// ============================================================================
// Save / Load
// ============================================================================

/// Serialize a model to `path` in the native artifact format.
pub fn save(model: &Model, path: &Path) -> Result<(), SaveError> {
    let payload = Payload::V1(model_to_payload(model));
    let bytes = postcard::to_allocvec(&payload)?;

    let mut header = FormatHeader::new(
        model.meta().n_features as u32,
        model.ensemble().n_trees() as u32,
    );

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_to(&mut writer, &mut header, &bytes)?;
    writer.flush()?;

    Ok(())
}

/// Deserialize a model from `path`, verifying checksum and structure.
pub fn load(path: &Path) -> Result<Model, LoadError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let (header, payload_bytes) = read_from(&mut reader)?;
    let payload: Payload = postcard::from_bytes(&payload_bytes)?;
    let Payload::V1(v1) = payload;

    if v1.ensemble.trees.len() != header.n_trees as usize {
        return Err(LoadError::CorruptPayload(format!(
            "header declares {} trees, payload holds {}",
            header.n_trees,
            v1.ensemble.trees.len()
        )));
    }

    model_from_payload(v1)
}
