//! Graph vocabulary: operator codes, fused activations, and nodes.

use std::fmt;

use smallvec::SmallVec;

use crate::id::TensorId;

/// The operators a model graph may reference.
///
/// The wire tag of each variant is fixed by the model format and must
/// never be renumbered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpCode {
    /// Dense layer: `out = in · Wᵀ + bias`, optional fused activation.
    FullyConnected,
    /// Rectified linear unit.
    Relu,
    /// Float (or int8) to int8 conversion.
    Quantize,
    /// Int8 to float conversion.
    Dequantize,
}

impl OpCode {
    /// Every operator, in wire-tag order.
    pub const ALL: [OpCode; 4] = [
        OpCode::FullyConnected,
        OpCode::Relu,
        OpCode::Quantize,
        OpCode::Dequantize,
    ];

    /// Wire tag used by the model format.
    pub fn tag(self) -> u8 {
        match self {
            Self::FullyConnected => 0,
            Self::Relu => 1,
            Self::Quantize => 2,
            Self::Dequantize => 3,
        }
    }

    /// Inverse of [`tag`](Self::tag).
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.tag() == tag)
    }

    /// Upper-case operator name, as used in logs and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::FullyConnected => "FULLY_CONNECTED",
            Self::Relu => "RELU",
            Self::Quantize => "QUANTIZE",
            Self::Dequantize => "DEQUANTIZE",
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Activation fused into an operator's output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Activation {
    /// Identity.
    #[default]
    None,
    /// `max(0, x)`.
    Relu,
}

impl Activation {
    /// Wire tag used by the model format.
    pub fn tag(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Relu => 1,
        }
    }

    /// Inverse of [`tag`](Self::tag).
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::None),
            1 => Some(Self::Relu),
            _ => None,
        }
    }

    /// Apply the activation to a float value.
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Self::None => x,
            Self::Relu => x.max(0.0),
        }
    }
}

/// One node of the model graph.
///
/// Input slots are optional so that operators with optional operands
/// (the fully-connected bias) can leave a hole without renumbering the
/// remaining inputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpNode {
    /// Which operator this node runs.
    pub opcode: OpCode,
    /// Activation fused into the output.
    pub activation: Activation,
    /// Input tensors in operator-defined order.
    pub inputs: SmallVec<[Option<TensorId>; 4]>,
    /// Output tensors in operator-defined order.
    pub outputs: SmallVec<[TensorId; 2]>,
}

impl OpNode {
    /// Create a node with no fused activation.
    pub fn new(
        opcode: OpCode,
        inputs: impl IntoIterator<Item = Option<TensorId>>,
        outputs: impl IntoIterator<Item = TensorId>,
    ) -> Self {
        Self {
            opcode,
            activation: Activation::None,
            inputs: inputs.into_iter().collect(),
            outputs: outputs.into_iter().collect(),
        }
    }

    /// Set the fused activation.
    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Every tensor this node touches, inputs first.
    pub fn tensors(&self) -> impl Iterator<Item = TensorId> + '_ {
        self.inputs
            .iter()
            .flatten()
            .copied()
            .chain(self.outputs.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_tags_round_trip() {
        for op in OpCode::ALL {
            assert_eq!(OpCode::from_tag(op.tag()), Some(op));
        }
        assert_eq!(OpCode::from_tag(4), None);
    }

    #[test]
    fn activation_tags_round_trip() {
        assert_eq!(Activation::from_tag(0), Some(Activation::None));
        assert_eq!(Activation::from_tag(1), Some(Activation::Relu));
        assert_eq!(Activation::from_tag(2), None);
    }

    #[test]
    fn relu_activation_clamps_negatives() {
        assert_eq!(Activation::Relu.apply(-2.5), 0.0);
        assert_eq!(Activation::Relu.apply(1.5), 1.5);
        assert_eq!(Activation::None.apply(-2.5), -2.5);
    }

    #[test]
    fn node_tensors_skips_absent_inputs() {
        let node = OpNode::new(
            OpCode::FullyConnected,
            [Some(TensorId(0)), Some(TensorId(1)), None],
            [TensorId(2)],
        );
        let ids: Vec<_> = node.tensors().collect();
        assert_eq!(ids, vec![TensorId(0), TensorId(1), TensorId(2)]);
    }
}
