//! Arena configuration parameters.

use crate::error::ArenaError;

/// Configuration for the tensor arena.
///
/// Validated by [`TensorArena::new`](crate::TensorArena::new); immutable
/// after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Total arena size in bytes.
    ///
    /// Default: 8192. Must be non-zero.
    pub capacity_bytes: usize,

    /// Alignment of every allocation in bytes.
    ///
    /// Default: 16. Must be a power of two.
    pub alignment: usize,
}

impl ArenaConfig {
    /// Default arena size: 8 KiB.
    pub const DEFAULT_CAPACITY_BYTES: usize = 8 * 1024;

    /// Default allocation alignment.
    pub const DEFAULT_ALIGNMENT: usize = 16;

    /// Create a config with the given capacity and default alignment.
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            alignment: Self::DEFAULT_ALIGNMENT,
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.capacity_bytes == 0 {
            return Err(ArenaError::ZeroCapacity);
        }
        if !self.alignment.is_power_of_two() {
            return Err(ArenaError::InvalidAlignment {
                alignment: self.alignment,
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_8k_aligned_16() {
        let config = ArenaConfig::default();
        assert_eq!(config.capacity_bytes, 8192);
        assert_eq!(config.alignment, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_capacity_rejected() {
        assert_eq!(ArenaConfig::new(0).validate(), Err(ArenaError::ZeroCapacity));
    }

    #[test]
    fn non_power_of_two_alignment_rejected() {
        let config = ArenaConfig {
            capacity_bytes: 64,
            alignment: 12,
        };
        assert_eq!(
            config.validate(),
            Err(ArenaError::InvalidAlignment { alignment: 12 })
        );
    }
}
