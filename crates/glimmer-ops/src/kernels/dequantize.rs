use glimmer_core::{dequantize_i8, ElementType, KernelError, OpCode};

use super::{expect_same_len, expect_type, quant_of};
use crate::context::KernelContext;
use crate::kernel::Kernel;

const OP: OpCode = OpCode::Dequantize;

/// Converts int8 to float32: `(q - zero_point) · scale`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Dequantize;

fn check(ctx: &KernelContext<'_>) -> Result<(), KernelError> {
    let input = ctx.input(0)?;
    let output = ctx.output_ref(0)?;
    expect_type(OP, &input, ElementType::Int8)?;
    expect_type(OP, &output, ElementType::Float32)?;
    quant_of(&input)?;
    expect_same_len(&input, &output)
}

impl Kernel for Dequantize {
    fn opcode(&self) -> OpCode {
        OP
    }

    fn prepare(&self, ctx: &KernelContext<'_>) -> Result<(), KernelError> {
        check(ctx)
    }

    fn eval(&self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
        check(ctx)?;
        let input = ctx.input(0)?;
        let params = quant_of(&input)?;
        let x: Vec<f32> = input
            .to_i8_vec()?
            .into_iter()
            .map(|q| dequantize_i8(q, params))
            .collect();
        ctx.output(0)?.store_f32(&x)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimmer_core::{OpNode, QuantParams, TensorId};
    use glimmer_test_utils::MockTensorStore;
    use proptest::prelude::*;

    fn node() -> OpNode {
        OpNode::new(OpCode::Dequantize, [Some(TensorId(0))], [TensorId(1)])
    }

    #[test]
    fn applies_scale_and_zero_point() {
        let q = QuantParams::new(0.5, -128).unwrap();
        let mut s = MockTensorStore::new();
        s.add_i8(0, &[3], q, &[-128, -127, 127])
            .add_zeroed(1, ElementType::Float32, None, &[3]);
        let n = node();
        Dequantize.eval(&mut KernelContext::new(&mut s, &n)).unwrap();
        assert_eq!(s.f32s(1), vec![0.0, 0.5, 127.5]);
    }

    #[test]
    fn float_input_is_unsupported() {
        let mut s = MockTensorStore::new();
        s.add_f32(0, &[1], &[1.0])
            .add_zeroed(1, ElementType::Float32, None, &[1]);
        let n = node();
        let err = Dequantize
            .prepare(&KernelContext::new(&mut s, &n))
            .unwrap_err();
        assert_eq!(
            err,
            KernelError::UnsupportedType {
                op: OpCode::Dequantize,
                element_type: ElementType::Float32,
            }
        );
    }

    proptest! {
        #[test]
        fn matches_scalar_dequantize(values in proptest::collection::vec(any::<i8>(), 1..32),
                                     zp in -128i32..=127,
                                     scale in 0.001f32..10.0) {
            let q = QuantParams::new(scale, zp).unwrap();
            let len = values.len() as u32;
            let mut s = MockTensorStore::new();
            s.add_i8(0, &[len], q, &values)
                .add_zeroed(1, ElementType::Float32, None, &[len]);
            let n = node();
            Dequantize.eval(&mut KernelContext::new(&mut s, &n)).unwrap();
            let expected: Vec<f32> = values.iter().map(|&v| dequantize_i8(v, q)).collect();
            prop_assert_eq!(s.f32s(1), expected);
        }
    }
}
