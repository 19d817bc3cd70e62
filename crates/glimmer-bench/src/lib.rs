//! Benchmark fixtures for the Glimmer inference loop.
//!
//! - [`sine_interpreter`]: an allocated interpreter over a reference model
//! - [`sine_loop`]: a started control loop on a simulated board
//! - [`sweep`]: evenly spaced phases covering one cycle

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::io;

use glimmer_arena::{ArenaConfig, TensorArena};
use glimmer_engine::{ControlLoop, LoopConfig, MicroInterpreter, Peripherals, SimulatedLed, Startup};
use glimmer_model::{sine_model, SineEncoding};
use glimmer_test_utils::fixtures::{builtin_resolver, sine_blob};
use glimmer_test_utils::SimClock;

/// Number of phases in [`sweep`].
pub const SWEEP: usize = 64;

/// Evenly spaced phases over `[0, 2π)`.
pub fn sweep() -> Vec<f32> {
    (0..SWEEP)
        .map(|i| i as f32 * std::f32::consts::TAU / SWEEP as f32)
        .collect()
}

/// Reference model with tensors allocated in a default-size arena.
pub fn sine_interpreter(encoding: SineEncoding) -> MicroInterpreter {
    let model = sine_model(encoding).build().unwrap();
    let arena = TensorArena::new(ArenaConfig::default()).unwrap();
    let mut interp = MicroInterpreter::new(model, builtin_resolver(), arena).unwrap();
    interp.allocate_tensors().unwrap();
    interp
}

/// Started loop with a simulated clock, an LED stand-in, and a discarding
/// diagnostic sink.
pub fn sine_loop(encoding: SineEncoding) -> ControlLoop<SimClock, SimulatedLed, io::Sink> {
    let board = Peripherals::new(SimClock::new(), SimulatedLed::new(), io::sink());
    Startup::new(LoopConfig::default())
        .start(&sine_blob(encoding), board)
        .unwrap()
}
