//! Allocation handles.

use std::fmt;

/// Location of one allocation within a [`TensorArena`](crate::TensorArena).
///
/// Regions are only minted by the arena, so a region always lies within
/// the arena that produced it and never overlaps another region from the
/// same arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct Region {
    pub(crate) offset: usize,
    pub(crate) len: usize,
}

impl Region {
    /// Byte offset from the start of the arena.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether this is a zero-length allocation.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the last byte.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Region(off={}, len={})", self.offset, self.len)
    }
}
