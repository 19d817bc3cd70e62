//! Bounded opcode → kernel registry.

use std::error::Error;
use std::fmt;

use glimmer_core::OpCode;
use indexmap::IndexMap;
use tracing::debug;

use crate::kernel::Kernel;
use crate::kernels::{Dequantize, FullyConnected, Quantize, Relu};

/// Default number of kernels a resolver accepts.
pub const DEFAULT_OP_CAPACITY: usize = 6;

/// Errors from registering a kernel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// The resolver already holds `capacity` kernels.
    CapacityExceeded {
        /// The resolver's fixed capacity.
        capacity: usize,
    },
    /// A kernel for this opcode is already registered.
    DuplicateOp {
        /// The opcode registered twice.
        op: OpCode,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded { capacity } => {
                write!(f, "op resolver is full ({capacity} kernels)")
            }
            Self::DuplicateOp { op } => write!(f, "{op} is already registered"),
        }
    }
}

impl Error for RegistryError {}

/// Maps each opcode a model may use to the kernel that runs it.
///
/// Populated once at startup and read-only afterwards. Registration
/// order is preserved for diagnostics.
pub struct OpResolver {
    kernels: IndexMap<OpCode, Box<dyn Kernel>>,
    capacity: usize,
}

impl OpResolver {
    /// An empty resolver accepting at most `capacity` kernels.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            kernels: IndexMap::with_capacity(capacity),
            capacity,
        }
    }

    /// Register a kernel under its own opcode.
    pub fn register(&mut self, kernel: Box<dyn Kernel>) -> Result<(), RegistryError> {
        let op = kernel.opcode();
        if self.kernels.contains_key(&op) {
            return Err(RegistryError::DuplicateOp { op });
        }
        if self.kernels.len() >= self.capacity {
            return Err(RegistryError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        debug!(op = %op, kernel = kernel.name(), slot = self.kernels.len(), "kernel registered");
        self.kernels.insert(op, kernel);
        Ok(())
    }

    /// Register the float fully-connected kernel.
    pub fn add_fully_connected(&mut self) -> Result<(), RegistryError> {
        self.register(Box::new(FullyConnected))
    }

    /// Register the ReLU kernel.
    pub fn add_relu(&mut self) -> Result<(), RegistryError> {
        self.register(Box::new(Relu))
    }

    /// Register the quantize kernel.
    pub fn add_quantize(&mut self) -> Result<(), RegistryError> {
        self.register(Box::new(Quantize))
    }

    /// Register the dequantize kernel.
    pub fn add_dequantize(&mut self) -> Result<(), RegistryError> {
        self.register(Box::new(Dequantize))
    }

    /// The kernel for `op`, if registered.
    pub fn find(&self, op: OpCode) -> Option<&dyn Kernel> {
        self.kernels.get(&op).map(|k| k.as_ref())
    }

    /// Registered opcodes in registration order.
    pub fn opcodes(&self) -> impl Iterator<Item = OpCode> + '_ {
        self.kernels.keys().copied()
    }

    /// Number of registered kernels.
    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    /// Whether no kernels are registered.
    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    /// Maximum number of kernels.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for OpResolver {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_OP_CAPACITY)
    }
}

impl fmt::Debug for OpResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpResolver")
            .field("ops", &self.kernels.keys().collect::<Vec<_>>())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_builtin_ops_fit_default_capacity() {
        let mut r = OpResolver::default();
        r.add_fully_connected().unwrap();
        r.add_relu().unwrap();
        r.add_quantize().unwrap();
        r.add_dequantize().unwrap();
        assert_eq!(r.len(), 4);
        assert_eq!(r.capacity(), DEFAULT_OP_CAPACITY);
        assert_eq!(
            r.opcodes().collect::<Vec<_>>(),
            vec![
                OpCode::FullyConnected,
                OpCode::Relu,
                OpCode::Quantize,
                OpCode::Dequantize
            ]
        );
        assert_eq!(r.find(OpCode::Relu).unwrap().name(), "RELU");
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut r = OpResolver::default();
        r.add_relu().unwrap();
        assert_eq!(
            r.add_relu(),
            Err(RegistryError::DuplicateOp { op: OpCode::Relu })
        );
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn registration_beyond_capacity_fails() {
        let mut r = OpResolver::with_capacity(2);
        r.add_fully_connected().unwrap();
        r.add_relu().unwrap();
        assert_eq!(
            r.add_quantize(),
            Err(RegistryError::CapacityExceeded { capacity: 2 })
        );
        assert!(r.find(OpCode::Quantize).is_none());
    }

    #[test]
    fn empty_resolver_finds_nothing() {
        let r = OpResolver::with_capacity(0);
        assert!(r.is_empty());
        for op in OpCode::ALL {
            assert!(r.find(op).is_none());
        }
    }
}
