//! The reference sine-approximating network.
//!
//! A 1 → [`HIDDEN_UNITS`] → 1 ReLU network. Hidden unit `i` computes
//! `relu(x - k_i)` for evenly spaced knots `k_i = i·2π/16`, and the output
//! layer sums them with weights chosen so that the network is the
//! piecewise-linear interpolant of `sin` through those knots. The maximum
//! error of that interpolant on `[0, 2π)` is below 0.02.
//!
//! Two encodings are available:
//!
//! - [`SineEncoding::Int8`]: int8 input and output tensors wrapped around a
//!   float core by `DEQUANTIZE` and `QUANTIZE` nodes. Input covers
//!   `[0, 2π]` in 255 steps; output covers `[-1, 1]` with scale `1/127`.
//! - [`SineEncoding::Float32`]: float input and output, with the hidden
//!   activation fused into the first dense layer.

use std::f64::consts::TAU;

use glimmer_core::{Activation, ElementType, OpCode, OpNode, QuantParams, TensorDef};
use tracing::debug;

use crate::builder::ModelBuilder;

/// Width of the hidden layer.
pub const HIDDEN_UNITS: usize = 16;

/// Input quantization: `[0, 2π]` over the full int8 range.
pub const INPUT_SCALE: f32 = (TAU / 255.0) as f32;
/// Stored value representing input 0.0.
pub const INPUT_ZERO_POINT: i32 = -128;
/// Output quantization: `[-1, 1]` with a symmetric zero point.
pub const OUTPUT_SCALE: f32 = 1.0 / 127.0;
/// Stored value representing output 0.0.
pub const OUTPUT_ZERO_POINT: i32 = 0;

/// Quantization of the int8 model's input tensor.
pub const INPUT_QUANT: QuantParams = QuantParams::new_const(INPUT_SCALE, INPUT_ZERO_POINT);
/// Quantization of the int8 model's output tensor.
pub const OUTPUT_QUANT: QuantParams = QuantParams::new_const(OUTPUT_SCALE, OUTPUT_ZERO_POINT);

/// Which tensor encoding the graph edges use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SineEncoding {
    /// Quantized int8 input and output.
    Int8,
    /// Float32 input and output.
    Float32,
}

impl SineEncoding {
    /// Short name used on the command line and in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Float32 => "f32",
        }
    }
}

/// Layer parameters of the interpolating network.
#[derive(Clone, Debug, PartialEq)]
pub struct SineWeights {
    /// First layer weights, shape `[HIDDEN_UNITS, 1]`.
    pub hidden_weights: Vec<f32>,
    /// First layer bias, shape `[HIDDEN_UNITS]`.
    pub hidden_bias: Vec<f32>,
    /// Second layer weights, shape `[1, HIDDEN_UNITS]`.
    pub output_weights: Vec<f32>,
    /// Second layer bias, shape `[1]`.
    pub output_bias: f32,
}

impl SineWeights {
    /// Fit the interpolant.
    pub fn fit() -> Self {
        let h = TAU / HIDDEN_UNITS as f64;
        let knot = |i: usize| i as f64 * h;
        // Slope of each linear segment; the weight of unit i is the change
        // in slope at knot i.
        let slopes: Vec<f64> = (0..HIDDEN_UNITS)
            .map(|i| (knot(i + 1).sin() - knot(i).sin()) / h)
            .collect();
        let output_weights = (0..HIDDEN_UNITS)
            .map(|i| {
                let prev = if i == 0 { 0.0 } else { slopes[i - 1] };
                (slopes[i] - prev) as f32
            })
            .collect();
        Self {
            hidden_weights: vec![1.0; HIDDEN_UNITS],
            hidden_bias: (0..HIDDEN_UNITS).map(|i| -knot(i) as f32).collect(),
            output_weights,
            output_bias: 0.0,
        }
    }

    /// Evaluate the network in plain float arithmetic.
    pub fn eval(&self, x: f32) -> f32 {
        let mut acc = self.output_bias;
        for i in 0..HIDDEN_UNITS {
            let h = (self.hidden_weights[i] * x + self.hidden_bias[i]).max(0.0);
            acc += self.output_weights[i] * h;
        }
        acc
    }
}

/// Build the reference sine network in the requested encoding.
pub fn sine_model(encoding: SineEncoding) -> ModelBuilder {
    let w = SineWeights::fit();
    let units = HIDDEN_UNITS as u32;
    let mut b = ModelBuilder::new();

    let (graph_input, core_input) = match encoding {
        SineEncoding::Int8 => {
            let q = b.add_tensor(
                TensorDef::activation("input", ElementType::Int8, [1, 1])
                    .with_quant(INPUT_QUANT),
            );
            let f = b.add_tensor(TensorDef::activation("input_f", ElementType::Float32, [1, 1]));
            (q, f)
        }
        SineEncoding::Float32 => {
            let f = b.add_tensor(TensorDef::activation("input", ElementType::Float32, [1, 1]));
            (f, f)
        }
    };

    let w1 = b.add_tensor(TensorDef::constant_f32(
        "dense_1/weights",
        [units, 1],
        &w.hidden_weights,
    ));
    let b1 = b.add_tensor(TensorDef::constant_f32(
        "dense_1/bias",
        [units],
        &w.hidden_bias,
    ));
    let w2 = b.add_tensor(TensorDef::constant_f32(
        "dense_2/weights",
        [1, units],
        &w.output_weights,
    ));
    let b2 = b.add_tensor(TensorDef::constant_f32(
        "dense_2/bias",
        [1],
        &[w.output_bias],
    ));

    match encoding {
        SineEncoding::Int8 => {
            let d1 = b.add_tensor(TensorDef::activation("dense_1", ElementType::Float32, [1, units]));
            let r1 = b.add_tensor(TensorDef::activation("relu", ElementType::Float32, [1, units]));
            let out_f =
                b.add_tensor(TensorDef::activation("output_f", ElementType::Float32, [1, 1]));
            let out_q = b.add_tensor(
                TensorDef::activation("output", ElementType::Int8, [1, 1])
                    .with_quant(OUTPUT_QUANT),
            );
            b.add_node(OpNode::new(OpCode::Dequantize, [Some(graph_input)], [core_input]))
                .add_node(OpNode::new(
                    OpCode::FullyConnected,
                    [Some(core_input), Some(w1), Some(b1)],
                    [d1],
                ))
                .add_node(OpNode::new(OpCode::Relu, [Some(d1)], [r1]))
                .add_node(OpNode::new(
                    OpCode::FullyConnected,
                    [Some(r1), Some(w2), Some(b2)],
                    [out_f],
                ))
                .add_node(OpNode::new(OpCode::Quantize, [Some(out_f)], [out_q]))
                .set_inputs([graph_input])
                .set_outputs([out_q]);
        }
        SineEncoding::Float32 => {
            let r1 = b.add_tensor(TensorDef::activation("dense_1", ElementType::Float32, [1, units]));
            let out = b.add_tensor(TensorDef::activation("output", ElementType::Float32, [1, 1]));
            b.add_node(
                OpNode::new(
                    OpCode::FullyConnected,
                    [Some(core_input), Some(w1), Some(b1)],
                    [r1],
                )
                .with_activation(Activation::Relu),
            )
            .add_node(OpNode::new(
                OpCode::FullyConnected,
                [Some(r1), Some(w2), Some(b2)],
                [out],
            ))
            .set_inputs([graph_input])
            .set_outputs([out]);
        }
    }
    debug!(encoding = encoding.name(), "sine model assembled");
    b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quant_constants_match_checked_constructor() {
        assert_eq!(
            QuantParams::new(INPUT_SCALE, INPUT_ZERO_POINT).unwrap(),
            INPUT_QUANT
        );
        let (lo, hi) = INPUT_QUANT.real_range();
        assert!(lo.abs() < 1e-6);
        assert!((hi - std::f32::consts::TAU).abs() < 1e-3);
    }

    #[test]
    fn interpolant_tracks_sine() {
        let w = SineWeights::fit();
        let mut worst = 0.0f32;
        for step in 0..1000 {
            let x = step as f32 * std::f32::consts::TAU / 1000.0;
            worst = worst.max((w.eval(x) - x.sin()).abs());
        }
        assert!(worst < 0.02, "max error {worst}");
    }

    #[test]
    fn interpolant_hits_knots() {
        let w = SineWeights::fit();
        for i in 0..HIDDEN_UNITS {
            let x = (i as f64 * TAU / HIDDEN_UNITS as f64) as f32;
            assert!((w.eval(x) - x.sin()).abs() < 1e-4);
        }
    }

    #[test]
    fn both_encodings_build() {
        for enc in [SineEncoding::Int8, SineEncoding::Float32] {
            let model = sine_model(enc).build().unwrap();
            assert_eq!(model.inputs().len(), 1);
            assert_eq!(model.outputs().len(), 1);
        }
    }

    #[test]
    fn int8_graph_uses_four_operators() {
        let model = sine_model(SineEncoding::Int8).build().unwrap();
        assert_eq!(
            model.opcodes(),
            vec![
                OpCode::Dequantize,
                OpCode::FullyConnected,
                OpCode::Relu,
                OpCode::Quantize
            ]
        );
        assert_eq!(model.tensors().len(), 10);
    }

    #[test]
    fn float_graph_edges_are_float() {
        let model = sine_model(SineEncoding::Float32).build().unwrap();
        let input = model.tensor(model.inputs()[0]).unwrap();
        let output = model.tensor(model.outputs()[0]).unwrap();
        assert_eq!(input.element_type, ElementType::Float32);
        assert_eq!(output.element_type, ElementType::Float32);
        assert_eq!(model.opcodes(), vec![OpCode::FullyConnected]);
    }
}
