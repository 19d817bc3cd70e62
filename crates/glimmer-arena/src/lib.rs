//! Fixed-capacity tensor arena for the Glimmer interpreter.
//!
//! The interpreter carves every activation tensor out of a single byte
//! buffer whose size is fixed when the arena is created (8 KiB by
//! default). Allocation is a bump pointer with per-allocation alignment;
//! nothing is ever freed, and the buffer is never resized. Running out of
//! space is reported as [`ArenaError::CapacityExceeded`] at startup, when
//! tensors are allocated, never later.
//!
//! ```text
//! TensorArena
//! ├── data: Box<[u8]>   (capacity bytes, zero-initialised)
//! └── cursor            (bytes handed out so far, incl. alignment padding)
//!       └── Region { offset, len } per allocation
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod config;
pub mod error;
pub mod region;

pub use arena::TensorArena;
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use region::Region;
