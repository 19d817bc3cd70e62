//! The fixed-size bump arena.
//!
//! [`TensorArena`] owns one zero-initialised byte buffer for its entire
//! lifetime. [`allocate`](TensorArena::allocate) rounds the bump pointer up
//! to the configured alignment and hands out a [`Region`]; there is no
//! free and no growth.

use tracing::{debug, trace};

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::region::Region;

/// Fixed-capacity scratch memory for interpreter tensors.
///
/// # Example
///
/// ```
/// use glimmer_arena::{ArenaConfig, TensorArena};
///
/// let mut arena = TensorArena::new(ArenaConfig::new(64)).unwrap();
/// let a = arena.allocate(4).unwrap();
/// let b = arena.allocate(4).unwrap();
/// assert_eq!(b.offset(), 16);
/// arena.bytes_mut(a).unwrap().copy_from_slice(&[1, 2, 3, 4]);
/// assert_eq!(arena.bytes(a).unwrap(), &[1, 2, 3, 4]);
/// ```
pub struct TensorArena {
    data: Box<[u8]>,
    cursor: usize,
    alignment: usize,
    allocations: usize,
}

impl TensorArena {
    /// Create an arena of `config.capacity_bytes` zeroed bytes.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        debug!(
            capacity = config.capacity_bytes,
            alignment = config.alignment,
            "tensor arena created"
        );
        Ok(Self {
            data: vec![0u8; config.capacity_bytes].into_boxed_slice(),
            cursor: 0,
            alignment: config.alignment,
            allocations: 0,
        })
    }

    /// Allocate `len` bytes at the next aligned offset.
    ///
    /// The returned region is zero-initialised. A zero-length request
    /// succeeds without consuming space.
    pub fn allocate(&mut self, len: usize) -> Result<Region, ArenaError> {
        let capacity = self.data.len();
        let exceeded = || ArenaError::CapacityExceeded {
            requested: len,
            available: capacity - self.cursor,
            capacity,
        };
        if len == 0 {
            return Ok(Region {
                offset: self.cursor,
                len: 0,
            });
        }
        let offset = self
            .cursor
            .checked_next_multiple_of(self.alignment)
            .ok_or_else(exceeded)?;
        let end = offset.checked_add(len).ok_or_else(exceeded)?;
        if end > capacity {
            return Err(exceeded());
        }
        self.cursor = end;
        self.allocations += 1;
        trace!(offset, len, used = end, "arena allocation");
        Ok(Region { offset, len })
    }

    /// Bytes of a region.
    ///
    /// Returns `None` if the region does not lie within this arena's
    /// allocated space (e.g. it came from another arena).
    pub fn bytes(&self, region: Region) -> Option<&[u8]> {
        if region.end() > self.cursor {
            return None;
        }
        self.data.get(region.offset..region.end())
    }

    /// Mutable bytes of a region. See [`bytes`](Self::bytes).
    pub fn bytes_mut(&mut self, region: Region) -> Option<&mut [u8]> {
        if region.end() > self.cursor {
            return None;
        }
        self.data.get_mut(region.offset..region.end())
    }

    /// Bytes handed out so far, including alignment padding.
    pub fn used(&self) -> usize {
        self.cursor
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes not yet handed out.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    /// Number of non-empty allocations made.
    pub fn allocation_count(&self) -> usize {
        self.allocations
    }
}

impl std::fmt::Debug for TensorArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TensorArena")
            .field("capacity", &self.data.len())
            .field("used", &self.cursor)
            .field("alignment", &self.alignment)
            .field("allocations", &self.allocations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arena(capacity: usize) -> TensorArena {
        TensorArena::new(ArenaConfig::new(capacity)).unwrap()
    }

    #[test]
    fn allocations_are_aligned_and_disjoint() {
        let mut a = arena(256);
        let r1 = a.allocate(1).unwrap();
        let r2 = a.allocate(64).unwrap();
        let r3 = a.allocate(4).unwrap();
        assert_eq!(r1.offset(), 0);
        assert_eq!(r2.offset(), 16);
        assert_eq!(r3.offset(), 80);
        assert_eq!(a.used(), 84);
        assert_eq!(a.allocation_count(), 3);
    }

    #[test]
    fn regions_start_zeroed_and_hold_writes() {
        let mut a = arena(64);
        let r = a.allocate(8).unwrap();
        assert!(a.bytes(r).unwrap().iter().all(|&b| b == 0));
        a.bytes_mut(r).unwrap().fill(0xAB);
        assert!(a.bytes(r).unwrap().iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn exact_fit_succeeds() {
        let mut a = arena(32);
        a.allocate(16).unwrap();
        a.allocate(16).unwrap();
        assert_eq!(a.remaining(), 0);
    }

    #[test]
    fn exhaustion_reports_capacity() {
        let mut a = arena(32);
        a.allocate(20).unwrap();
        let err = a.allocate(8).unwrap_err();
        assert_eq!(
            err,
            ArenaError::CapacityExceeded {
                requested: 8,
                available: 12,
                capacity: 32,
            }
        );
        // A failed allocation leaves the arena untouched.
        assert_eq!(a.used(), 20);
        assert_eq!(a.allocation_count(), 1);
    }

    #[test]
    fn zero_length_allocation_is_free() {
        let mut a = arena(16);
        let r = a.allocate(0).unwrap();
        assert!(r.is_empty());
        assert_eq!(a.used(), 0);
        assert_eq!(a.bytes(r).unwrap().len(), 0);
    }

    #[test]
    fn foreign_region_is_rejected() {
        let mut big = arena(128);
        let small = arena(128);
        let r = big.allocate(100).unwrap();
        assert!(small.bytes(r).is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert_eq!(
            TensorArena::new(ArenaConfig::new(0)).unwrap_err(),
            ArenaError::ZeroCapacity
        );
    }

    proptest! {
        #[test]
        fn never_exceeds_capacity(sizes in proptest::collection::vec(0usize..200, 0..40)) {
            let mut a = arena(1024);
            let mut regions: Vec<Region> = Vec::new();
            for len in sizes {
                if let Ok(r) = a.allocate(len) {
                    if !r.is_empty() {
                        prop_assert_eq!(r.offset() % 16, 0);
                    }
                    regions.push(r);
                }
                prop_assert!(a.used() <= a.capacity());
            }
            let live: Vec<_> = regions.iter().filter(|r| !r.is_empty()).collect();
            for (i, x) in live.iter().enumerate() {
                for y in &live[i + 1..] {
                    prop_assert!(x.end() <= y.offset() || y.end() <= x.offset());
                }
            }
        }
    }
}
