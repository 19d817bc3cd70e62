//! Error types for model loading.

use std::fmt;

use glimmer_core::TensorError;

/// Errors that can occur while decoding or validating a model.
#[derive(Debug)]
pub enum ModelError {
    /// The blob does not start with the expected `b"GLMF"` magic bytes.
    InvalidMagic {
        /// The first four bytes found.
        found: [u8; 4],
    },
    /// The blob was produced for a different schema version.
    SchemaMismatch {
        /// The version declared by the blob.
        found: u32,
        /// The version this runtime supports.
        supported: u32,
    },
    /// The blob ended before a record was complete.
    Truncated {
        /// Byte offset at which more data was needed.
        offset: usize,
        /// Number of bytes needed at that offset.
        needed: usize,
    },
    /// Bytes remain after the last record.
    TrailingBytes {
        /// Number of unread bytes.
        count: usize,
    },
    /// A record could not be decoded (unknown tag, bad UTF-8, ...).
    Malformed {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// A node or graph edge references a tensor index past the table.
    TensorIndexOutOfRange {
        /// The offending index.
        index: u32,
        /// Number of tensors in the model.
        tensor_count: usize,
    },
    /// A tensor definition is internally inconsistent.
    InvalidTensor {
        /// Name of the tensor.
        name: String,
        /// Description of the inconsistency.
        reason: String,
    },
    /// The graph structure is invalid (no inputs, constant output, ...).
    InvalidGraph {
        /// Description of the problem.
        reason: String,
    },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMagic { found } => {
                write!(f, "invalid magic bytes {found:02x?} (expected b\"GLMF\")")
            }
            Self::SchemaMismatch { found, supported } => write!(
                f,
                "model provided is schema version {found} not equal to supported version {supported}"
            ),
            Self::Truncated { offset, needed } => {
                write!(f, "truncated model: needed {needed} bytes at offset {offset}")
            }
            Self::TrailingBytes { count } => {
                write!(f, "{count} trailing bytes after model graph")
            }
            Self::Malformed { detail } => write!(f, "malformed model: {detail}"),
            Self::TensorIndexOutOfRange {
                index,
                tensor_count,
            } => write!(
                f,
                "tensor index {index} out of range (model has {tensor_count} tensors)"
            ),
            Self::InvalidTensor { name, reason } => {
                write!(f, "invalid tensor '{name}': {reason}")
            }
            Self::InvalidGraph { reason } => write!(f, "invalid graph: {reason}"),
        }
    }
}

impl std::error::Error for ModelError {}

impl ModelError {
    pub(crate) fn tensor(name: &str, e: TensorError) -> Self {
        Self::InvalidTensor {
            name: name.to_string(),
            reason: e.to_string(),
        }
    }
}
