//! Error types shared across the Glimmer workspace.
//!
//! [`TensorError`] covers typed access to tensor bytes and quantization
//! parameters; [`KernelError`] is what an operator kernel returns from
//! `prepare` or `eval` and is wrapped by the interpreter with the name of
//! the failing operator.

use std::error::Error;
use std::fmt;

use crate::graph::OpCode;
use crate::tensor::ElementType;

/// Errors from typed tensor access and quantization.
#[derive(Clone, Debug, PartialEq)]
pub enum TensorError {
    /// The tensor holds a different element type than the caller asked for.
    TypeMismatch {
        /// The element type the caller expected.
        expected: ElementType,
        /// The element type the tensor declares.
        found: ElementType,
    },
    /// A bulk store did not match the tensor's element count.
    LengthMismatch {
        /// Number of elements the tensor holds.
        expected: usize,
        /// Number of elements supplied.
        found: usize,
    },
    /// Element index past the end of the tensor.
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of elements in the tensor.
        len: usize,
    },
    /// A fixed-point tensor has no quantization parameters attached.
    MissingQuantization,
    /// Quantization parameters failed validation.
    InvalidQuantization {
        /// The rejected scale.
        scale: f32,
        /// The rejected zero point.
        zero_point: i32,
    },
}

impl fmt::Display for TensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { expected, found } => {
                write!(f, "element type mismatch: expected {expected}, found {found}")
            }
            Self::LengthMismatch { expected, found } => {
                write!(f, "length mismatch: tensor holds {expected} elements, got {found}")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "element index {index} out of range for tensor of {len}")
            }
            Self::MissingQuantization => write!(f, "int8 tensor has no quantization parameters"),
            Self::InvalidQuantization { scale, zero_point } => write!(
                f,
                "invalid quantization parameters: scale={scale}, zero_point={zero_point} \
                 (scale must be finite and positive, zero_point within int8)"
            ),
        }
    }
}

impl Error for TensorError {}

/// Errors from operator kernel preparation or evaluation.
///
/// Returned by `Kernel::prepare()` / `Kernel::eval()` and wrapped in the
/// interpreter's `KernelFailed` variant together with the node index.
#[derive(Clone, Debug, PartialEq)]
pub enum KernelError {
    /// A required input slot is absent or refers to an unknown tensor.
    MissingInput {
        /// Position in the node's input list.
        index: usize,
    },
    /// A required output slot is absent or not writable.
    MissingOutput {
        /// Position in the node's output list.
        index: usize,
    },
    /// The kernel does not implement this element type.
    UnsupportedType {
        /// The operator rejecting the tensor.
        op: OpCode,
        /// The offending element type.
        element_type: ElementType,
    },
    /// Tensor shapes are inconsistent with the operator.
    ShapeMismatch {
        /// Description of the mismatch.
        reason: String,
    },
    /// Typed tensor access failed.
    Tensor(TensorError),
    /// Any other evaluation failure.
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInput { index } => write!(f, "input {index} missing"),
            Self::MissingOutput { index } => write!(f, "output {index} missing or not writable"),
            Self::UnsupportedType { op, element_type } => {
                write!(f, "{op} does not support {element_type} tensors")
            }
            Self::ShapeMismatch { reason } => write!(f, "shape mismatch: {reason}"),
            Self::Tensor(e) => write!(f, "tensor access: {e}"),
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
        }
    }
}

impl Error for KernelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Tensor(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TensorError> for KernelError {
    fn from(e: TensorError) -> Self {
        Self::Tensor(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_error_chains_tensor_source() {
        let err = KernelError::from(TensorError::MissingQuantization);
        assert!(err.source().is_some());
        assert!(err.to_string().contains("quantization"));
    }

    #[test]
    fn unsupported_type_names_op_and_type() {
        let err = KernelError::UnsupportedType {
            op: OpCode::Dequantize,
            element_type: ElementType::Float32,
        };
        assert_eq!(err.to_string(), "DEQUANTIZE does not support float32 tensors");
    }
}
