//! Dense layer: `out[b][u] = act(Σ_i in[b][i] · W[u][i] + bias[u])`.

use glimmer_core::{ElementType, KernelError, OpCode};

use super::expect_type;
use crate::context::KernelContext;
use crate::kernel::Kernel;

const OP: OpCode = OpCode::FullyConnected;

/// Float32 fully-connected kernel with optional bias and fused activation.
///
/// Inputs: `0` activations (any shape whose element count is a multiple
/// of `in`), `1` weights `[units, in]`, `2` optional bias `[units]`.
/// Output `0` holds `batch × units` elements.
#[derive(Clone, Copy, Debug, Default)]
pub struct FullyConnected;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Dims {
    batch: usize,
    in_features: usize,
    units: usize,
}

fn dims(ctx: &KernelContext<'_>) -> Result<Dims, KernelError> {
    let input = ctx.input(0)?;
    expect_type(OP, &input, ElementType::Float32)?;
    let weights = ctx.input(1)?;
    expect_type(OP, &weights, ElementType::Float32)?;

    let (units, in_features) = match weights.shape() {
        &[u, i] if u > 0 && i > 0 => (u as usize, i as usize),
        other => {
            return Err(KernelError::ShapeMismatch {
                reason: format!("weights must be [units, in], got {other:?}"),
            })
        }
    };
    if input.len() % in_features != 0 {
        return Err(KernelError::ShapeMismatch {
            reason: format!(
                "input has {} elements, not a multiple of {in_features}",
                input.len()
            ),
        });
    }
    let batch = input.len() / in_features;

    if let Some(bias) = ctx.optional_input(2)? {
        expect_type(OP, &bias, ElementType::Float32)?;
        if bias.len() != units {
            return Err(KernelError::ShapeMismatch {
                reason: format!("bias has {} elements, expected {units}", bias.len()),
            });
        }
    }

    let output = ctx.output_ref(0)?;
    expect_type(OP, &output, ElementType::Float32)?;
    if output.len() != batch * units {
        return Err(KernelError::ShapeMismatch {
            reason: format!(
                "output has {} elements, expected {}",
                output.len(),
                batch * units
            ),
        });
    }
    Ok(Dims {
        batch,
        in_features,
        units,
    })
}

impl Kernel for FullyConnected {
    fn opcode(&self) -> OpCode {
        OP
    }

    fn prepare(&self, ctx: &KernelContext<'_>) -> Result<(), KernelError> {
        dims(ctx).map(|_| ())
    }

    fn eval(&self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
        let Dims {
            batch,
            in_features,
            units,
        } = dims(ctx)?;
        let x = ctx.input(0)?.to_f32_vec()?;
        let w = ctx.input(1)?.to_f32_vec()?;
        let bias = ctx
            .optional_input(2)?
            .map(|b| b.to_f32_vec())
            .transpose()?;
        let activation = ctx.node().activation;

        let mut out = Vec::with_capacity(batch * units);
        for row in x.chunks_exact(in_features) {
            for (u, weights) in w.chunks_exact(in_features).enumerate() {
                let dot: f32 = row.iter().zip(weights).map(|(a, b)| a * b).sum();
                let b = bias.as_ref().map_or(0.0, |bias| bias[u]);
                out.push(activation.apply(dot + b));
            }
        }
        ctx.output(0)?.store_f32(&out)?;
        Ok(())
    }
}
