//! Test utilities and mock types for Glimmer development.
//!
//! Provides mock implementations of the core traits ([`TensorStore`],
//! [`Clock`], [`Actuator`]) plus kernel and model fixtures in
//! [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::HashMap;
use std::time::Duration;

use glimmer_core::{
    Actuator, Clock, ElementType, QuantParams, TensorId, TensorMut, TensorRef, TensorStore,
};

struct MockTensor {
    element_type: ElementType,
    quant: Option<QuantParams>,
    shape: Vec<u32>,
    bytes: Vec<u8>,
    constant: bool,
}

/// Mock implementation of [`TensorStore`].
///
/// Backed by a `HashMap<TensorId, _>`. Populate tensors with the `add_*`
/// methods before handing the store to a kernel, then read results back
/// with [`f32s`](Self::f32s) or [`i8s`](Self::i8s).
#[derive(Default)]
pub struct MockTensorStore {
    tensors: HashMap<TensorId, MockTensor>,
}

impl MockTensorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a writable float tensor holding `values`.
    pub fn add_f32(&mut self, id: impl Into<TensorId>, shape: &[u32], values: &[f32]) -> &mut Self {
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.insert(id.into(), ElementType::Float32, None, shape, bytes, false)
    }

    /// Add a read-only float tensor holding `values`.
    pub fn add_constant_f32(
        &mut self,
        id: impl Into<TensorId>,
        shape: &[u32],
        values: &[f32],
    ) -> &mut Self {
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.insert(id.into(), ElementType::Float32, None, shape, bytes, true)
    }

    /// Add a writable int8 tensor holding `values`.
    pub fn add_i8(
        &mut self,
        id: impl Into<TensorId>,
        shape: &[u32],
        quant: QuantParams,
        values: &[i8],
    ) -> &mut Self {
        let bytes = values.iter().map(|&v| v as u8).collect();
        self.insert(id.into(), ElementType::Int8, Some(quant), shape, bytes, false)
    }

    /// Add a zero-filled writable tensor.
    pub fn add_zeroed(
        &mut self,
        id: impl Into<TensorId>,
        element_type: ElementType,
        quant: Option<QuantParams>,
        shape: &[u32],
    ) -> &mut Self {
        let len = shape.iter().product::<u32>() as usize * element_type.size();
        self.insert(id.into(), element_type, quant, shape, vec![0; len], false)
    }

    /// Current contents of a float tensor.
    pub fn f32s(&self, id: impl Into<TensorId>) -> Vec<f32> {
        self.tensor(id.into())
            .and_then(|t| t.to_f32_vec().ok())
            .unwrap_or_default()
    }

    /// Current contents of an int8 tensor.
    pub fn i8s(&self, id: impl Into<TensorId>) -> Vec<i8> {
        self.tensor(id.into())
            .and_then(|t| t.to_i8_vec().ok())
            .unwrap_or_default()
    }

    fn insert(
        &mut self,
        id: TensorId,
        element_type: ElementType,
        quant: Option<QuantParams>,
        shape: &[u32],
        bytes: Vec<u8>,
        constant: bool,
    ) -> &mut Self {
        self.tensors.insert(
            id,
            MockTensor {
                element_type,
                quant,
                shape: shape.to_vec(),
                bytes,
                constant,
            },
        );
        self
    }
}

impl TensorStore for MockTensorStore {
    fn tensor(&self, id: TensorId) -> Option<TensorRef<'_>> {
        self.tensors
            .get(&id)
            .map(|t| TensorRef::new(t.element_type, t.quant, &t.shape, &t.bytes))
    }

    fn tensor_mut(&mut self, id: TensorId) -> Option<TensorMut<'_>> {
        self.tensors
            .get_mut(&id)
            .filter(|t| !t.constant)
            .map(|t| TensorMut::new(t.element_type, t.quant, &mut t.bytes))
    }
}

/// Simulated [`Clock`]: `sleep` advances time instead of blocking.
#[derive(Clone, Debug, Default)]
pub struct SimClock {
    now: Duration,
    sleeps: Vec<Duration>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock at `now` instead of boot.
    pub fn starting_at(now: Duration) -> Self {
        Self {
            now,
            sleeps: Vec::new(),
        }
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> &[Duration] {
        &self.sleeps
    }
}

impl Clock for SimClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
        self.now += duration;
    }
}

/// [`Actuator`] that records every level it is driven at.
#[derive(Clone, Debug, Default)]
pub struct RecordingActuator {
    init_calls: usize,
    levels: Vec<u8>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `init()` has been called.
    pub fn init_calls(&self) -> usize {
        self.init_calls
    }

    /// Levels set so far, oldest first.
    pub fn levels(&self) -> &[u8] {
        &self.levels
    }

    /// The most recent level, if any.
    pub fn last(&self) -> Option<u8> {
        self.levels.last().copied()
    }
}

impl Actuator for RecordingActuator {
    fn init(&mut self) {
        self.init_calls += 1;
    }

    fn set_level(&mut self, level: u8) {
        self.levels.push(level);
    }
}
