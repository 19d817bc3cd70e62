//! Core types and traits for the Glimmer inference loop.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the rest of the workspace: tensor IDs and
//! definitions, graph nodes, quantization math, error types, the
//! [`TensorStore`] trait that kernels read and write through, and the
//! [`Clock`] and [`Actuator`] traits that abstract the board.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod graph;
pub mod id;
pub mod quant;
pub mod tensor;
pub mod traits;

pub use error::{KernelError, TensorError};
pub use graph::{Activation, OpCode, OpNode};
pub use id::TensorId;
pub use quant::{decode, dequantize_i8, encode, quantize_i8, QuantParams, StoredValue};
pub use tensor::{ElementType, Shape, TensorDef, TensorMut, TensorRef};
pub use traits::{Actuator, Clock, TensorStore};
