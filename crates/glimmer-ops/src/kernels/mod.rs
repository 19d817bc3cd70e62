//! Built-in kernels.
//!
//! | Kernel | Inputs | Output |
//! |---|---|---|
//! | [`FullyConnected`] | f32 input, f32 weights `[units, in]`, optional f32 bias `[units]` | f32 |
//! | [`Relu`] | f32 or int8 | same type and length |
//! | [`Quantize`] | f32 or int8 | int8 |
//! | [`Dequantize`] | int8 | f32 |

mod dequantize;
mod fully_connected;
mod quantize;
mod relu;

pub use dequantize::Dequantize;
pub use fully_connected::FullyConnected;
pub use quantize::Quantize;
pub use relu::Relu;

use glimmer_core::{ElementType, KernelError, OpCode, QuantParams, TensorError, TensorRef};

fn expect_type(op: OpCode, t: &TensorRef<'_>, expected: ElementType) -> Result<(), KernelError> {
    if t.element_type() != expected {
        return Err(KernelError::UnsupportedType {
            op,
            element_type: t.element_type(),
        });
    }
    Ok(())
}

fn expect_same_len(input: &TensorRef<'_>, output: &TensorRef<'_>) -> Result<(), KernelError> {
    if input.len() != output.len() {
        return Err(KernelError::ShapeMismatch {
            reason: format!(
                "input has {} elements, output has {}",
                input.len(),
                output.len()
            ),
        });
    }
    Ok(())
}

fn quant_of(t: &TensorRef<'_>) -> Result<QuantParams, KernelError> {
    Ok(t.quant().ok_or(TensorError::MissingQuantization)?)
}
