use glimmer_core::{dequantize_i8, quantize_i8, ElementType, KernelError, OpCode};

use super::{expect_same_len, expect_type, quant_of};
use crate::context::KernelContext;
use crate::kernel::Kernel;

const OP: OpCode = OpCode::Quantize;

/// Converts float32 (or requantizes int8) to int8 with the output
/// tensor's parameters. Rounds half away from zero and saturates.
#[derive(Clone, Copy, Debug, Default)]
pub struct Quantize;

fn check(ctx: &KernelContext<'_>) -> Result<ElementType, KernelError> {
    let input = ctx.input(0)?;
    let output = ctx.output_ref(0)?;
    expect_type(OP, &output, ElementType::Int8)?;
    quant_of(&output)?;
    if input.element_type() == ElementType::Int8 {
        quant_of(&input)?;
    }
    expect_same_len(&input, &output)?;
    Ok(input.element_type())
}

impl Kernel for Quantize {
    fn opcode(&self) -> OpCode {
        OP
    }

    fn prepare(&self, ctx: &KernelContext<'_>) -> Result<(), KernelError> {
        check(ctx).map(|_| ())
    }

    fn eval(&self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
        let out_q = quant_of(&ctx.output_ref(0)?)?;
        let input = ctx.input(0)?;
        let q: Vec<i8> = match check(ctx)? {
            ElementType::Float32 => input
                .to_f32_vec()?
                .into_iter()
                .map(|x| quantize_i8(x, out_q))
                .collect(),
            ElementType::Int8 => {
                let in_q = quant_of(&input)?;
                input
                    .to_i8_vec()?
                    .into_iter()
                    .map(|v| quantize_i8(dequantize_i8(v, in_q), out_q))
                    .collect()
            }
        };
        ctx.output(0)?.store_i8(&q)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimmer_core::{OpNode, QuantParams, TensorId};
    use glimmer_test_utils::MockTensorStore;

    fn node() -> OpNode {
        OpNode::new(OpCode::Quantize, [Some(TensorId(0))], [TensorId(1)])
    }

    #[test]
    fn float_to_int8_rounds_and_saturates() {
        let q = QuantParams::new(1.0 / 127.0, 0).unwrap();
        let mut s = MockTensorStore::new();
        s.add_f32(0, &[5], &[0.0, 1.0, -1.0, 2.0, f32::NAN])
            .add_zeroed(1, ElementType::Int8, Some(q), &[5]);
        let n = node();
        Quantize.eval(&mut KernelContext::new(&mut s, &n)).unwrap();
        assert_eq!(s.i8s(1), vec![0, 127, -127, 127, 0]);
    }

    #[test]
    fn int8_input_is_requantized() {
        let in_q = QuantParams::new(0.5, 0).unwrap();
        let out_q = QuantParams::new(1.0, 10).unwrap();
        let mut s = MockTensorStore::new();
        s.add_i8(0, &[3], in_q, &[4, -4, 127])
            .add_zeroed(1, ElementType::Int8, Some(out_q), &[3]);
        let n = node();
        Quantize.eval(&mut KernelContext::new(&mut s, &n)).unwrap();
        // 2.0 → 12, -2.0 → 8, 63.5 → round(73.5) = 74
        assert_eq!(s.i8s(1), vec![12, 8, 74]);
    }

    #[test]
    fn float_output_is_unsupported() {
        let mut s = MockTensorStore::new();
        s.add_f32(0, &[1], &[1.0])
            .add_zeroed(1, ElementType::Float32, None, &[1]);
        let n = node();
        let err = Quantize
            .prepare(&KernelContext::new(&mut s, &n))
            .unwrap_err();
        assert_eq!(
            err,
            KernelError::UnsupportedType {
                op: OpCode::Quantize,
                element_type: ElementType::Float32,
            }
        );
    }
}
