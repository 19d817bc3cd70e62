//! Fixed-point quantization math.
//!
//! A quantized tensor stores `q` and represents `real = (q - zero_point) * scale`.
//! Encoding rounds half away from zero and saturates to the int8 range;
//! a NaN encodes to the zero point. Float32 tensors pass values through
//! unchanged, so the same caller code serves quantized and float models.

use crate::error::TensorError;
use crate::tensor::ElementType;

/// Per-tensor affine quantization parameters.
///
/// Invariant: `scale` is finite and strictly positive and `zero_point`
/// lies within the int8 range. Enforced by [`QuantParams::new`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuantParams {
    scale: f32,
    zero_point: i32,
}

impl QuantParams {
    /// Validate and build quantization parameters.
    pub fn new(scale: f32, zero_point: i32) -> Result<Self, TensorError> {
        let zp_ok = (i8::MIN as i32..=i8::MAX as i32).contains(&zero_point);
        if !scale.is_finite() || scale <= 0.0 || !zp_ok {
            return Err(TensorError::InvalidQuantization { scale, zero_point });
        }
        Ok(Self { scale, zero_point })
    }

    /// Build parameters in a `const` context.
    ///
    /// # Panics
    ///
    /// Panics (at compile time when evaluated in a `const`) under the same
    /// conditions [`new`](Self::new) rejects.
    pub const fn new_const(scale: f32, zero_point: i32) -> Self {
        assert!(scale.is_finite() && scale > 0.0, "scale must be finite and positive");
        assert!(
            zero_point >= i8::MIN as i32 && zero_point <= i8::MAX as i32,
            "zero point outside int8 range"
        );
        Self { scale, zero_point }
    }

    /// Real-valued size of one quantization step.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Stored value that represents real zero.
    pub fn zero_point(&self) -> i32 {
        self.zero_point
    }

    /// Smallest and largest real values representable without saturation.
    pub fn real_range(&self) -> (f32, f32) {
        (
            dequantize_i8(i8::MIN, *self),
            dequantize_i8(i8::MAX, *self),
        )
    }
}

/// A single tensor element in its stored encoding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StoredValue {
    /// Float32 element.
    Float32(f32),
    /// Int8 element.
    Int8(i8),
}

impl StoredValue {
    /// The encoding of this value.
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Float32(_) => ElementType::Float32,
            Self::Int8(_) => ElementType::Int8,
        }
    }
}

/// Quantize a real value to int8: `round(x / scale + zero_point)`, saturated.
pub fn quantize_i8(x: f32, params: QuantParams) -> i8 {
    if x.is_nan() {
        return params.zero_point as i8;
    }
    let q = (x / params.scale + params.zero_point as f32).round();
    q.clamp(i8::MIN as f32, i8::MAX as f32) as i8
}

/// Recover the real value of an int8 element.
pub fn dequantize_i8(q: i8, params: QuantParams) -> f32 {
    (q as i32 - params.zero_point) as f32 * params.scale
}

/// Encode `x` for a tensor of the given element type.
///
/// Int8 tensors require quantization parameters; float32 tensors store
/// `x` unchanged.
pub fn encode(
    x: f32,
    element_type: ElementType,
    quant: Option<QuantParams>,
) -> Result<StoredValue, TensorError> {
    match element_type {
        ElementType::Float32 => Ok(StoredValue::Float32(x)),
        ElementType::Int8 => {
            let params = quant.ok_or(TensorError::MissingQuantization)?;
            Ok(StoredValue::Int8(quantize_i8(x, params)))
        }
    }
}

/// Decode a stored element back to a real value.
pub fn decode(value: StoredValue, quant: Option<QuantParams>) -> Result<f32, TensorError> {
    match value {
        StoredValue::Float32(v) => Ok(v),
        StoredValue::Int8(q) => {
            let params = quant.ok_or(TensorError::MissingQuantization)?;
            Ok(dequantize_i8(q, params))
        }
    }
}
