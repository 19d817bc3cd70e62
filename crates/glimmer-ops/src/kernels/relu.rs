use glimmer_core::{dequantize_i8, quantize_i8, ElementType, KernelError, OpCode, TensorError};

use super::{expect_same_len, quant_of};
use crate::context::KernelContext;
use crate::kernel::Kernel;

/// Element-wise `max(0, x)`.
///
/// Int8 tensors sharing quantization parameters clamp at the zero point
/// directly; otherwise values are requantized to the output parameters.
#[derive(Clone, Copy, Debug, Default)]
pub struct Relu;

fn check(ctx: &KernelContext<'_>) -> Result<ElementType, KernelError> {
    let input = ctx.input(0)?;
    let output = ctx.output_ref(0)?;
    if input.element_type() != output.element_type() {
        return Err(TensorError::TypeMismatch {
            expected: input.element_type(),
            found: output.element_type(),
        }
        .into());
    }
    expect_same_len(&input, &output)?;
    if input.element_type() == ElementType::Int8 {
        quant_of(&input)?;
        quant_of(&output)?;
    }
    Ok(input.element_type())
}

impl Kernel for Relu {
    fn opcode(&self) -> OpCode {
        OpCode::Relu
    }

    fn prepare(&self, ctx: &KernelContext<'_>) -> Result<(), KernelError> {
        check(ctx).map(|_| ())
    }

    fn eval(&self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
        match check(ctx)? {
            ElementType::Float32 => {
                let mut x = ctx.input(0)?.to_f32_vec()?;
                for v in &mut x {
                    *v = v.max(0.0);
                }
                ctx.output(0)?.store_f32(&x)?;
            }
            ElementType::Int8 => {
                let input = ctx.input(0)?;
                let in_q = quant_of(&input)?;
                let mut q = input.to_i8_vec()?;
                let out_q = quant_of(&ctx.output_ref(0)?)?;
                if in_q == out_q {
                    let floor = in_q.zero_point() as i8;
                    for v in &mut q {
                        *v = (*v).max(floor);
                    }
                } else {
                    for v in &mut q {
                        *v = quantize_i8(dequantize_i8(*v, in_q).max(0.0), out_q);
                    }
                }
                ctx.output(0)?.store_i8(&q)?;
            }
        }
        Ok(())
    }
}
