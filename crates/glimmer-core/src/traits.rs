//! Seams between the inference loop and its environment: tensor storage
//! for kernels, and the clock and actuator of the board.

use std::time::Duration;

use crate::id::TensorId;
use crate::tensor::{TensorMut, TensorRef};

/// Typed access to every tensor of a running graph.
///
/// Implemented by the interpreter over its model constants and arena,
/// and by mock stores in tests. Returns `None` for an unknown tensor, a
/// tensor that has not been allocated yet, or (for
/// [`tensor_mut`](Self::tensor_mut)) a constant.
pub trait TensorStore {
    /// Read-only view of a tensor.
    fn tensor(&self, id: TensorId) -> Option<TensorRef<'_>>;

    /// Mutable view of an activation tensor.
    fn tensor_mut(&mut self, id: TensorId) -> Option<TensorMut<'_>>;
}

/// Monotonic time source of the board.
///
/// `now` reports time elapsed since boot and never goes backwards.
/// `sleep` blocks the calling loop; simulated clocks advance their own
/// notion of time instead.
pub trait Clock {
    /// Time elapsed since boot.
    fn now(&self) -> Duration;

    /// Block for `duration`.
    fn sleep(&mut self, duration: Duration);
}

/// An output device driven by an 8-bit intensity level.
pub trait Actuator {
    /// Prepare the device. Called once before the first level is set.
    fn init(&mut self);

    /// Drive the device at `level` (0 = off, 255 = full).
    fn set_level(&mut self, level: u8);
}
