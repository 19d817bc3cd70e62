//! Glimmer: a tiny quantized network that predicts `sin(x)` and drives an
//! LED from the prediction, once every 20 ms.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Glimmer sub-crates, embeds the reference models, and hosts the
//! `glimmer` command-line tool.
//!
//! # Quick start
//!
//! ```rust
//! use glimmer::prelude::*;
//! use glimmer::models;
//!
//! let board = Peripherals::new(SystemClock::new(), SimulatedLed::new(), Vec::new());
//! let mut control = Startup::new(LoopConfig::default())
//!     .start(models::SINE_INT8, board)
//!     .unwrap();
//! let it = control.step().unwrap();
//! assert!((it.prediction - it.reference).abs() < 0.05);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `glimmer-core` | Tensors, graph nodes, quantization math, board traits |
//! | [`arena`] | `glimmer-arena` | Fixed-capacity tensor arena |
//! | [`model`] | `glimmer-model` | Model format, loader, builder, reference network |
//! | [`ops`] | `glimmer-ops` | Kernel trait, operator registry, reference kernels |
//! | [`engine`] | `glimmer-engine` | Interpreter, signal, actuator mapping, control loop |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod models;

/// Core types, traits, and quantization math (`glimmer-core`).
pub use glimmer_core as types;

/// Fixed-capacity tensor arena (`glimmer-arena`).
pub use glimmer_arena as arena;

/// Model format, loader, and builder (`glimmer-model`).
///
/// [`model::Model::load`] rejects blobs whose schema version differs from
/// [`model::SCHEMA_VERSION`].
pub use glimmer_model as model;

/// Operator kernels and registry (`glimmer-ops`).
pub use glimmer_ops as ops;

/// Interpreter and control loop (`glimmer-engine`).
pub use glimmer_engine as engine;

/// Process exit status after a start-up failure or a runtime halt.
///
/// The 8-bit encoding of `-1`.
pub const HALT_EXIT_STATUS: u8 = 255;

/// Common imports for typical Glimmer usage.
pub mod prelude {
    // Board seams
    pub use glimmer_core::{Actuator, Clock};

    // Model
    pub use glimmer_model::{Model, ModelBuilder, SineEncoding};

    // Registry
    pub use glimmer_ops::OpResolver;

    // Engine
    pub use glimmer_engine::{
        ControlLoop, Iteration, LoopConfig, LoopError, LoopState, MicroInterpreter, Peripherals,
        RunReport, SimulatedLed, Startup, StartupError, SystemClock,
    };
}
