//! Execution context passed to kernels.

use glimmer_core::{KernelError, OpNode, TensorMut, TensorRef, TensorStore};

/// The node being executed and the tensors it may touch.
///
/// Uses `&mut dyn TensorStore` so the [`Kernel`](crate::Kernel) trait
/// stays object-safe and kernels can be driven by a mock store in tests.
///
/// Input accessors borrow the context immutably. Kernels copy what they
/// need out of their inputs before asking for an output.
pub struct KernelContext<'a> {
    store: &'a mut dyn TensorStore,
    node: &'a OpNode,
}

impl<'a> KernelContext<'a> {
    /// Construct a context for one node.
    pub fn new(store: &'a mut dyn TensorStore, node: &'a OpNode) -> Self {
        Self { store, node }
    }

    /// The node being executed.
    pub fn node(&self) -> &OpNode {
        self.node
    }

    /// Number of input slots, including absent optional ones.
    pub fn input_count(&self) -> usize {
        self.node.inputs.len()
    }

    /// A required input.
    pub fn input(&self, index: usize) -> Result<TensorRef<'_>, KernelError> {
        self.optional_input(index)?
            .ok_or(KernelError::MissingInput { index })
    }

    /// An optional input. An absent slot, or a slot past the end of the
    /// input list, is `Ok(None)`; a slot naming an unknown tensor is an
    /// error.
    pub fn optional_input(&self, index: usize) -> Result<Option<TensorRef<'_>>, KernelError> {
        match self.node.inputs.get(index).copied().flatten() {
            None => Ok(None),
            Some(id) => self
                .store
                .tensor(id)
                .map(Some)
                .ok_or(KernelError::MissingInput { index }),
        }
    }

    /// Read-only view of an output, for shape checks during prepare.
    pub fn output_ref(&self, index: usize) -> Result<TensorRef<'_>, KernelError> {
        let id = self
            .node
            .outputs
            .get(index)
            .copied()
            .ok_or(KernelError::MissingOutput { index })?;
        self.store
            .tensor(id)
            .ok_or(KernelError::MissingOutput { index })
    }

    /// Writable view of an output.
    pub fn output(&mut self, index: usize) -> Result<TensorMut<'_>, KernelError> {
        let id = self
            .node
            .outputs
            .get(index)
            .copied()
            .ok_or(KernelError::MissingOutput { index })?;
        self.store
            .tensor_mut(id)
            .ok_or(KernelError::MissingOutput { index })
    }
}
