//! Binary model format and loader for Glimmer.
//!
//! A model blob is an immutable byte buffer compiled into the binary (or
//! read from disk once at startup). [`Model::load`] checks the magic and
//! the schema version before decoding anything else, so a blob built for
//! a different runtime is rejected with [`ModelError::SchemaMismatch`]
//! rather than misparsed.
//!
//! # Format
//!
//! ```text
//! [MAGIC "GLMF"] [SCHEMA_VERSION u32]
//! [tensor_count u32] [Tensor]*
//! [node_count u32]   [Node]*
//! [input_count u8] [u32]*  [output_count u8] [u32]*
//! ```
//!
//! All integers are little-endian; strings and constant buffers are
//! length-prefixed with a `u32`. See [`codec`] for the per-record layout.
//!
//! # Architecture
//!
//! - [`ModelBuilder`] assembles tensors and nodes and writes blobs
//! - [`Model`] is the decoded, validated graph
//! - [`sine`] builds the reference sine-approximating network

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod codec;
pub mod error;
pub mod model;
pub mod sine;

pub use builder::ModelBuilder;
pub use error::ModelError;
pub use model::Model;
pub use sine::{sine_model, SineEncoding};

/// Magic bytes at the start of every model blob.
pub const MAGIC: [u8; 4] = *b"GLMF";

/// Schema version this runtime understands.
///
/// A blob declaring any other version is refused at load time.
pub const SCHEMA_VERSION: u32 = 3;
