//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a tensor within a model graph.
///
/// `TensorId(n)` is the n-th entry of the model's tensor table. The
/// interpreter hands these out as tensor handles for the graph's inputs
/// and outputs; they stay valid for the lifetime of the interpreter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TensorId(pub u32);

impl TensorId {
    /// The tensor-table index as a `usize`.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TensorId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_bare_index() {
        assert_eq!(TensorId(7).to_string(), "7");
        assert_eq!(TensorId::from(3).index(), 3);
    }
}
