//! The graph interpreter.
//!
//! [`MicroInterpreter`] owns a model, the kernels that run it, and the
//! arena its activations live in. Lifecycle:
//!
//! 1. [`new`](MicroInterpreter::new) resolves every node's opcode.
//! 2. [`allocate_tensors`](MicroInterpreter::allocate_tensors) carves the
//!    activations out of the arena and lets each kernel validate its node.
//! 3. [`input`](MicroInterpreter::input) / [`output`](MicroInterpreter::output)
//!    hand out [`TensorHandle`]s, valid for the interpreter's lifetime.
//! 4. [`invoke`](MicroInterpreter::invoke) runs the graph, as often as
//!    needed.

use std::time::Instant;

use glimmer_arena::{Region, TensorArena};
use glimmer_core::{TensorDef, TensorId, TensorMut, TensorRef, TensorStore};
use glimmer_model::Model;
use glimmer_ops::{KernelContext, OpResolver};
use tracing::debug;

use crate::error::InterpreterError;
use crate::metrics::InvokeMetrics;

/// A graph input or output, as handed out by the interpreter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TensorHandle(TensorId);

impl TensorHandle {
    /// The tensor this handle refers to.
    pub fn id(self) -> TensorId {
        self.0
    }
}

/// Runs a model graph out of a fixed arena.
pub struct MicroInterpreter {
    model: Model,
    resolver: OpResolver,
    arena: TensorArena,
    /// Arena region of each tensor; `None` for constants and before allocation.
    regions: Vec<Option<Region>>,
    allocated: bool,
    metrics: InvokeMetrics,
}

impl MicroInterpreter {
    /// Bind a model to its kernels and arena.
    ///
    /// Fails if any node's opcode has no kernel in `resolver`.
    pub fn new(
        model: Model,
        resolver: OpResolver,
        arena: TensorArena,
    ) -> Result<Self, InterpreterError> {
        for (node, n) in model.nodes().iter().enumerate() {
            if resolver.find(n.opcode).is_none() {
                return Err(InterpreterError::UnresolvedOp { node, op: n.opcode });
            }
        }
        let regions = vec![None; model.tensors().len()];
        Ok(Self {
            model,
            resolver,
            arena,
            regions,
            allocated: false,
            metrics: InvokeMetrics::default(),
        })
    }

    /// Allocate every activation tensor and prepare every node.
    pub fn allocate_tensors(&mut self) -> Result<(), InterpreterError> {
        if self.allocated {
            return Err(InterpreterError::AlreadyAllocated);
        }
        for (slot, def) in self.regions.iter_mut().zip(self.model.tensors()) {
            if def.is_constant() {
                continue;
            }
            // Loaded models have validated shapes, so byte_len is Some.
            let len = def.byte_len().unwrap_or(usize::MAX);
            let region = self
                .arena
                .allocate(len)
                .map_err(|source| InterpreterError::Allocation {
                    tensor: def.name.clone(),
                    source,
                })?;
            *slot = Some(region);
        }
        debug!(
            used = self.arena.used(),
            capacity = self.arena.capacity(),
            tensors = self.arena.allocation_count(),
            "tensors allocated"
        );

        let mut store = Tensors {
            defs: self.model.tensors(),
            regions: &self.regions,
            arena: &mut self.arena,
        };
        for (index, node) in self.model.nodes().iter().enumerate() {
            let kernel = self
                .resolver
                .find(node.opcode)
                .ok_or(InterpreterError::UnresolvedOp {
                    node: index,
                    op: node.opcode,
                })?;
            kernel
                .prepare(&KernelContext::new(&mut store, node))
                .map_err(|source| InterpreterError::PrepareFailed {
                    node: index,
                    op: node.opcode,
                    source,
                })?;
        }
        self.allocated = true;
        Ok(())
    }

    /// Handle to graph input `index`.
    pub fn input(&self, index: usize) -> Result<TensorHandle, InterpreterError> {
        self.ensure_allocated()?;
        let inputs = self.model.inputs();
        inputs
            .get(index)
            .map(|&id| TensorHandle(id))
            .ok_or(InterpreterError::NoSuchInput {
                index,
                count: inputs.len(),
            })
    }

    /// Handle to graph output `index`.
    pub fn output(&self, index: usize) -> Result<TensorHandle, InterpreterError> {
        self.ensure_allocated()?;
        let outputs = self.model.outputs();
        outputs
            .get(index)
            .map(|&id| TensorHandle(id))
            .ok_or(InterpreterError::NoSuchOutput {
                index,
                count: outputs.len(),
            })
    }

    /// Read-only view of a tensor.
    pub fn tensor(&self, handle: TensorHandle) -> Result<TensorRef<'_>, InterpreterError> {
        self.ensure_allocated()?;
        read(self.model.tensors(), &self.regions, &self.arena, handle.0)
            .ok_or(InterpreterError::InvalidHandle { id: handle.0 })
    }

    /// Writable view of an activation tensor.
    pub fn tensor_mut(&mut self, handle: TensorHandle) -> Result<TensorMut<'_>, InterpreterError> {
        self.ensure_allocated()?;
        let invalid = InterpreterError::InvalidHandle { id: handle.0 };
        let def = match self.model.tensor(handle.0) {
            Some(def) if !def.is_constant() => def,
            _ => return Err(invalid),
        };
        let Some(region) = self.regions.get(handle.0.index()).copied().flatten() else {
            return Err(invalid);
        };
        let bytes = self.arena.bytes_mut(region).ok_or(invalid)?;
        Ok(TensorMut::new(def.element_type, def.quant, bytes))
    }

    /// Run every node in order.
    pub fn invoke(&mut self) -> Result<(), InterpreterError> {
        self.ensure_allocated()?;
        let start = Instant::now();
        let mut node_us = Vec::with_capacity(self.model.nodes().len());
        let mut store = Tensors {
            defs: self.model.tensors(),
            regions: &self.regions,
            arena: &mut self.arena,
        };
        for (index, node) in self.model.nodes().iter().enumerate() {
            let kernel = self
                .resolver
                .find(node.opcode)
                .ok_or(InterpreterError::UnresolvedOp {
                    node: index,
                    op: node.opcode,
                })?;
            let node_start = Instant::now();
            kernel
                .eval(&mut KernelContext::new(&mut store, node))
                .map_err(|source| InterpreterError::KernelFailed {
                    node: index,
                    op: node.opcode,
                    source,
                })?;
            node_us.push((node.opcode, node_start.elapsed().as_micros() as u64));
        }
        self.metrics.total_us = start.elapsed().as_micros() as u64;
        self.metrics.node_us = node_us;
        self.metrics.invocations += 1;
        Ok(())
    }

    /// Timings of the most recent successful invoke.
    pub fn metrics(&self) -> &InvokeMetrics {
        &self.metrics
    }

    /// The model being run.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// The registered kernels.
    pub fn resolver(&self) -> &OpResolver {
        &self.resolver
    }

    /// Whether [`allocate_tensors`](Self::allocate_tensors) has succeeded.
    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// Arena bytes in use, including alignment padding.
    pub fn arena_used(&self) -> usize {
        self.arena.used()
    }

    /// Total arena capacity.
    pub fn arena_capacity(&self) -> usize {
        self.arena.capacity()
    }

    fn ensure_allocated(&self) -> Result<(), InterpreterError> {
        if self.allocated {
            Ok(())
        } else {
            Err(InterpreterError::NotAllocated)
        }
    }
}

impl std::fmt::Debug for MicroInterpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MicroInterpreter")
            .field("tensors", &self.model.tensors().len())
            .field("nodes", &self.model.nodes().len())
            .field("resolver", &self.resolver)
            .field("arena", &self.arena)
            .field("allocated", &self.allocated)
            .finish()
    }
}

// ── Tensor storage views ─────────────────────────────────────────

/// Mutable store handed to kernels. Constants are read-only.
struct Tensors<'a> {
    defs: &'a [TensorDef],
    regions: &'a [Option<Region>],
    arena: &'a mut TensorArena,
}

fn read<'a>(
    defs: &'a [TensorDef],
    regions: &[Option<Region>],
    arena: &'a TensorArena,
    id: TensorId,
) -> Option<TensorRef<'a>> {
    let def = defs.get(id.index())?;
    let bytes = match &def.data {
        Some(data) => data.as_slice(),
        None => arena.bytes((*regions.get(id.index())?)?)?,
    };
    Some(TensorRef::new(def.element_type, def.quant, &def.shape, bytes))
}

impl TensorStore for Tensors<'_> {
    fn tensor(&self, id: TensorId) -> Option<TensorRef<'_>> {
        read(self.defs, self.regions, self.arena, id)
    }

    fn tensor_mut(&mut self, id: TensorId) -> Option<TensorMut<'_>> {
        let def = self.defs.get(id.index())?;
        if def.is_constant() {
            return None;
        }
        let region = (*self.regions.get(id.index())?)?;
        let bytes = self.arena.bytes_mut(region)?;
        Some(TensorMut::new(def.element_type, def.quant, bytes))
    }
}
