//! Error types for the interpreter and the control loop.

use std::error::Error;
use std::fmt;

use glimmer_arena::ArenaError;
use glimmer_core::{KernelError, OpCode, TensorError, TensorId};
use glimmer_model::ModelError;
use glimmer_ops::RegistryError;

use crate::config::ConfigError;

// ── InterpreterError ───────────────────────────────────────────────

/// Errors from [`MicroInterpreter`](crate::MicroInterpreter).
#[derive(Clone, Debug, PartialEq)]
pub enum InterpreterError {
    /// A graph node uses an opcode with no registered kernel.
    UnresolvedOp {
        /// Index of the node in execution order.
        node: usize,
        /// The unregistered opcode.
        op: OpCode,
    },
    /// The arena could not hold a tensor.
    Allocation {
        /// Name of the tensor being allocated.
        tensor: String,
        /// The arena's report.
        source: ArenaError,
    },
    /// [`allocate_tensors`](crate::MicroInterpreter::allocate_tensors)
    /// was called twice.
    AlreadyAllocated,
    /// Tensors have not been allocated yet.
    NotAllocated,
    /// The graph has no input at this index.
    NoSuchInput {
        /// Requested index.
        index: usize,
        /// Number of graph inputs.
        count: usize,
    },
    /// The graph has no output at this index.
    NoSuchOutput {
        /// Requested index.
        index: usize,
        /// Number of graph outputs.
        count: usize,
    },
    /// A handle does not name an accessible tensor.
    InvalidHandle {
        /// The tensor the handle refers to.
        id: TensorId,
    },
    /// A kernel rejected its node while preparing.
    PrepareFailed {
        /// Index of the node in execution order.
        node: usize,
        /// The node's opcode.
        op: OpCode,
        /// The kernel's report.
        source: KernelError,
    },
    /// A kernel failed while evaluating its node.
    KernelFailed {
        /// Index of the node in execution order.
        node: usize,
        /// The node's opcode.
        op: OpCode,
        /// The kernel's report.
        source: KernelError,
    },
}

impl fmt::Display for InterpreterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedOp { node, op } => {
                write!(f, "node {node}: no kernel registered for {op}")
            }
            Self::Allocation { tensor, source } => {
                write!(f, "cannot allocate tensor '{tensor}': {source}")
            }
            Self::AlreadyAllocated => write!(f, "tensors already allocated"),
            Self::NotAllocated => write!(f, "tensors not allocated"),
            Self::NoSuchInput { index, count } => {
                write!(f, "input {index} out of range (graph has {count})")
            }
            Self::NoSuchOutput { index, count } => {
                write!(f, "output {index} out of range (graph has {count})")
            }
            Self::InvalidHandle { id } => write!(f, "no accessible tensor {id}"),
            Self::PrepareFailed { node, op, source } => {
                write!(f, "node {node} ({op}) failed to prepare: {source}")
            }
            Self::KernelFailed { node, op, source } => {
                write!(f, "node {node} ({op}) failed to invoke: {source}")
            }
        }
    }
}

impl Error for InterpreterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Allocation { source, .. } => Some(source),
            Self::PrepareFailed { source, .. } | Self::KernelFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ── StartupError ───────────────────────────────────────────────────

/// Fatal errors of the `Uninitialized → Ready` transition.
#[derive(Debug)]
pub enum StartupError {
    /// The loop configuration is invalid.
    Config(ConfigError),
    /// The model blob was rejected (including schema mismatch).
    Model(ModelError),
    /// An operator could not be registered.
    Registry(RegistryError),
    /// Interpreter construction, allocation, or handle lookup failed.
    Interpreter(InterpreterError),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Model(e) => write!(f, "model: {e}"),
            Self::Registry(e) => write!(f, "op registry: {e}"),
            Self::Interpreter(e) => write!(f, "interpreter: {e}"),
        }
    }
}

impl Error for StartupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Model(e) => Some(e),
            Self::Registry(e) => Some(e),
            Self::Interpreter(e) => Some(e),
        }
    }
}

impl From<ConfigError> for StartupError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ModelError> for StartupError {
    fn from(e: ModelError) -> Self {
        Self::Model(e)
    }
}

impl From<RegistryError> for StartupError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

impl From<InterpreterError> for StartupError {
    fn from(e: InterpreterError) -> Self {
        Self::Interpreter(e)
    }
}

// ── LoopError ──────────────────────────────────────────────────────

/// Errors from a running [`ControlLoop`](crate::ControlLoop).
///
/// The first error of any kind halts the loop; every later call returns
/// [`LoopError::Halted`].
#[derive(Clone, Debug, PartialEq)]
pub enum LoopError {
    /// The loop halted on an earlier error.
    Halted,
    /// The interpreter failed (typically an invoke failure).
    Interpreter(InterpreterError),
    /// A value could not be encoded into or decoded from a graph tensor.
    Adapter(TensorError),
}

impl fmt::Display for LoopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Halted => write!(f, "control loop halted"),
            Self::Interpreter(e) => write!(f, "interpreter: {e}"),
            Self::Adapter(e) => write!(f, "tensor adapter: {e}"),
        }
    }
}

impl Error for LoopError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Halted => None,
            Self::Interpreter(e) => Some(e),
            Self::Adapter(e) => Some(e),
        }
    }
}

impl From<InterpreterError> for LoopError {
    fn from(e: InterpreterError) -> Self {
        Self::Interpreter(e)
    }
}

impl From<TensorError> for LoopError {
    fn from(e: TensorError) -> Self {
        Self::Adapter(e)
    }
}
