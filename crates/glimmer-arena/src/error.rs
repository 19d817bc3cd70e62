//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during arena construction or allocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The allocation does not fit in the remaining arena space.
    CapacityExceeded {
        /// Number of bytes requested (excluding alignment padding).
        requested: usize,
        /// Bytes still free before the request was made.
        available: usize,
        /// Total arena capacity.
        capacity: usize,
    },
    /// The arena was configured with zero bytes.
    ZeroCapacity,
    /// The configured alignment is not a power of two.
    InvalidAlignment {
        /// The rejected alignment.
        alignment: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                requested,
                available,
                capacity,
            } => {
                write!(
                    f,
                    "arena capacity exceeded: requested {requested} bytes, \
                     {available} of {capacity} bytes available"
                )
            }
            Self::ZeroCapacity => write!(f, "arena capacity must be non-zero"),
            Self::InvalidAlignment { alignment } => {
                write!(f, "arena alignment {alignment} is not a power of two")
            }
        }
    }
}

impl Error for ArenaError {}
