//! Operator kernels and the resolver that maps opcodes to them.
//!
//! A [`Kernel`] implements one [`OpCode`](glimmer_core::OpCode). Kernels
//! are stateless; everything they touch goes through the
//! [`KernelContext`] handed to them by the interpreter. The
//! [`OpResolver`] is a bounded registry filled once at startup.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod context;
pub mod kernel;
pub mod kernels;
pub mod resolver;

pub use context::KernelContext;
pub use kernel::Kernel;
pub use kernels::{Dequantize, FullyConnected, Quantize, Relu};
pub use resolver::{OpResolver, RegistryError, DEFAULT_OP_CAPACITY};
