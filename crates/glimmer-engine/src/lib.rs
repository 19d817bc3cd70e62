//! The Glimmer inference loop.
//!
//! Wires a loaded [`Model`](glimmer_model::Model), an
//! [`OpResolver`](glimmer_ops::OpResolver), and a fixed
//! [`TensorArena`](glimmer_arena::TensorArena) into a
//! [`MicroInterpreter`], then drives it from a [`ControlLoop`]:
//!
//! ```text
//! clock ─▶ phase ─▶ encode ─▶ invoke ─▶ decode ─▶ brightness ─▶ actuator
//!                                          └────▶ diagnostic line
//! ```
//!
//! [`Startup`] performs the fallible `Uninitialized → Ready` transition
//! once; the resulting [`ControlLoop`] owns the interpreter, the tensor
//! handles, and the board [`Peripherals`] for the rest of the process.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod actuator;
pub mod adapter;
pub mod board;
pub mod config;
pub mod control;
pub mod diagnostic;
pub mod error;
pub mod interpreter;
pub mod metrics;
pub mod signal;

pub use actuator::{brightness, SimulatedLed};
pub use board::SystemClock;
pub use config::{ConfigError, LoopConfig};
pub use control::{ControlLoop, Iteration, LoopState, Peripherals, RunReport, Startup};
pub use diagnostic::{Diagnostic, ParseDiagnosticError};
pub use error::{InterpreterError, LoopError, StartupError};
pub use interpreter::{MicroInterpreter, TensorHandle};
pub use metrics::{InvokeMetrics, LoopMetrics};
pub use signal::{phase, SignalGenerator, PHASE_RATE};
