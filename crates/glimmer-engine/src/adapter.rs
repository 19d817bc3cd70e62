//! Moving scalar values across the graph boundary.
//!
//! The loop works in real numbers; graph inputs and outputs may be float32
//! or quantized int8. These helpers apply the tensor's own encoding so the
//! loop code is identical for both.

use glimmer_core::{decode, encode, StoredValue, TensorError, TensorMut, TensorRef};

/// Encode `x` into element 0 of `input`. Returns what was stored.
pub fn write_input(input: &mut TensorMut<'_>, x: f32) -> Result<StoredValue, TensorError> {
    let value = encode(x, input.element_type(), input.quant())?;
    input.set(0, value)?;
    Ok(value)
}

/// Decode element 0 of `output` to a real value.
pub fn read_output(output: &TensorRef<'_>) -> Result<f32, TensorError> {
    decode(output.get(0)?, output.quant())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimmer_core::{ElementType, QuantParams};

    #[test]
    fn float_passes_through() {
        let mut bytes = [0u8; 4];
        let mut t = TensorMut::new(ElementType::Float32, None, &mut bytes);
        assert_eq!(write_input(&mut t, 1.25).unwrap(), StoredValue::Float32(1.25));
        let r = TensorRef::new(ElementType::Float32, None, &[1], &bytes);
        assert_eq!(read_output(&r).unwrap(), 1.25);
    }

    #[test]
    fn int8_input_is_quantized() {
        let q = QuantParams::new(0.0246, -128).unwrap();
        let mut bytes = [0u8; 1];
        let mut t = TensorMut::new(ElementType::Int8, Some(q), &mut bytes);
        assert_eq!(write_input(&mut t, 0.0).unwrap(), StoredValue::Int8(-128));
        assert_eq!(write_input(&mut t, 100.0).unwrap(), StoredValue::Int8(127));
        assert_eq!(bytes[0] as i8, 127);
    }

    #[test]
    fn int8_output_is_dequantized() {
        let q = QuantParams::new(0.5, 0).unwrap();
        let bytes = [(-3i8) as u8];
        let r = TensorRef::new(ElementType::Int8, Some(q), &[1], &bytes);
        assert_eq!(read_output(&r).unwrap(), -1.5);
    }

    #[test]
    fn int8_without_params_is_an_error() {
        let mut bytes = [0u8; 1];
        let mut t = TensorMut::new(ElementType::Int8, None, &mut bytes);
        assert_eq!(
            write_input(&mut t, 1.0),
            Err(TensorError::MissingQuantization)
        );
    }

    #[test]
    fn empty_tensor_is_out_of_range() {
        let mut bytes: [u8; 0] = [];
        let mut t = TensorMut::new(ElementType::Float32, None, &mut bytes);
        assert!(matches!(
            write_input(&mut t, 1.0),
            Err(TensorError::IndexOutOfRange { .. })
        ));
    }
}
