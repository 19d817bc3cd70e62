//! Tensor definitions and typed views over tensor bytes.
//!
//! Tensor data is stored as raw little-endian bytes, either in the
//! model's constant buffers or in the interpreter's arena. [`TensorRef`]
//! and [`TensorMut`] pair those bytes with the declared element type and
//! quantization parameters so that callers never reinterpret bytes by
//! hand.

use std::fmt;

use smallvec::SmallVec;

use crate::error::TensorError;
use crate::quant::{QuantParams, StoredValue};

/// Tensor dimensions, outermost first.
pub type Shape = SmallVec<[u32; 4]>;

/// Element encoding of a tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// IEEE-754 single precision.
    Float32,
    /// Signed 8-bit fixed point, interpreted through [`QuantParams`].
    Int8,
}

impl ElementType {
    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::Float32 => 4,
            Self::Int8 => 1,
        }
    }

    /// Wire tag used by the model format.
    pub fn tag(self) -> u8 {
        match self {
            Self::Float32 => 0,
            Self::Int8 => 1,
        }
    }

    /// Inverse of [`tag`](Self::tag).
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Float32),
            1 => Some(Self::Int8),
            _ => None,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float32 => f.write_str("float32"),
            Self::Int8 => f.write_str("int8"),
        }
    }
}

/// Definition of one entry in a model's tensor table.
///
/// A tensor with `data` is a constant (weights, biases) and lives in the
/// model for the life of the process. A tensor without `data` is an
/// activation and is carved out of the arena by the interpreter.
#[derive(Clone, Debug, PartialEq)]
pub struct TensorDef {
    /// Human-readable name for diagnostics.
    pub name: String,
    /// Element encoding.
    pub element_type: ElementType,
    /// Dimensions, outermost first.
    pub shape: Shape,
    /// Fixed-point parameters; required for [`ElementType::Int8`].
    pub quant: Option<QuantParams>,
    /// Constant payload, little-endian.
    pub data: Option<Vec<u8>>,
}

impl TensorDef {
    /// An activation tensor (no constant data).
    pub fn activation(
        name: impl Into<String>,
        element_type: ElementType,
        shape: impl IntoIterator<Item = u32>,
    ) -> Self {
        Self {
            name: name.into(),
            element_type,
            shape: shape.into_iter().collect(),
            quant: None,
            data: None,
        }
    }

    /// A constant float32 tensor holding `values`.
    pub fn constant_f32(
        name: impl Into<String>,
        shape: impl IntoIterator<Item = u32>,
        values: &[f32],
    ) -> Self {
        let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self {
            name: name.into(),
            element_type: ElementType::Float32,
            shape: shape.into_iter().collect(),
            quant: None,
            data: Some(data),
        }
    }

    /// Attach quantization parameters.
    pub fn with_quant(mut self, quant: QuantParams) -> Self {
        self.quant = Some(quant);
        self
    }

    /// Whether this tensor carries constant data.
    pub fn is_constant(&self) -> bool {
        self.data.is_some()
    }

    /// Number of elements, or `None` if the product overflows `usize`.
    pub fn element_count(&self) -> Option<usize> {
        self.shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d as usize))
    }

    /// Storage size in bytes, or `None` on overflow.
    pub fn byte_len(&self) -> Option<usize> {
        self.element_count()?.checked_mul(self.element_type.size())
    }
}

// ── Typed views ────────────────────────────────────────────────

/// Read-only typed view of a tensor's bytes.
#[derive(Clone, Copy, Debug)]
pub struct TensorRef<'a> {
    element_type: ElementType,
    quant: Option<QuantParams>,
    shape: &'a [u32],
    bytes: &'a [u8],
}

impl<'a> TensorRef<'a> {
    /// Wrap `bytes` as a tensor of the given type and shape.
    ///
    /// Trailing bytes that do not form a whole element are ignored.
    pub fn new(
        element_type: ElementType,
        quant: Option<QuantParams>,
        shape: &'a [u32],
        bytes: &'a [u8],
    ) -> Self {
        Self {
            element_type,
            quant,
            shape,
            bytes,
        }
    }

    /// Element encoding.
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// Quantization parameters, if any.
    pub fn quant(&self) -> Option<QuantParams> {
        self.quant
    }

    /// Dimensions, outermost first.
    pub fn shape(&self) -> &'a [u32] {
        self.shape
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.bytes.len() / self.element_type.size()
    }

    /// Whether the tensor holds zero elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read one element in its stored encoding.
    pub fn get(&self, index: usize) -> Result<StoredValue, TensorError> {
        let len = self.len();
        if index >= len {
            return Err(TensorError::IndexOutOfRange { index, len });
        }
        Ok(match self.element_type {
            ElementType::Float32 => {
                let at = index * 4;
                let mut raw = [0u8; 4];
                raw.copy_from_slice(&self.bytes[at..at + 4]);
                StoredValue::Float32(f32::from_le_bytes(raw))
            }
            ElementType::Int8 => StoredValue::Int8(self.bytes[index] as i8),
        })
    }

    /// Copy out every element of a float32 tensor.
    pub fn to_f32_vec(&self) -> Result<Vec<f32>, TensorError> {
        self.expect_type(ElementType::Float32)?;
        Ok(self
            .bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    /// Copy out every element of an int8 tensor.
    pub fn to_i8_vec(&self) -> Result<Vec<i8>, TensorError> {
        self.expect_type(ElementType::Int8)?;
        Ok(self.bytes.iter().map(|&b| b as i8).collect())
    }

    fn expect_type(&self, expected: ElementType) -> Result<(), TensorError> {
        if self.element_type != expected {
            return Err(TensorError::TypeMismatch {
                expected,
                found: self.element_type,
            });
        }
        Ok(())
    }
}

/// Mutable typed view of a tensor's bytes.
#[derive(Debug)]
pub struct TensorMut<'a> {
    element_type: ElementType,
    quant: Option<QuantParams>,
    bytes: &'a mut [u8],
}

impl<'a> TensorMut<'a> {
    /// Wrap `bytes` as a writable tensor of the given type.
    pub fn new(element_type: ElementType, quant: Option<QuantParams>, bytes: &'a mut [u8]) -> Self {
        Self {
            element_type,
            quant,
            bytes,
        }
    }

    /// Element encoding.
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// Quantization parameters, if any.
    pub fn quant(&self) -> Option<QuantParams> {
        self.quant
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.bytes.len() / self.element_type.size()
    }

    /// Whether the tensor holds zero elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write one element. The value's encoding must match the tensor's.
    pub fn set(&mut self, index: usize, value: StoredValue) -> Result<(), TensorError> {
        let len = self.len();
        if index >= len {
            return Err(TensorError::IndexOutOfRange { index, len });
        }
        match (self.element_type, value) {
            (ElementType::Float32, StoredValue::Float32(v)) => {
                let at = index * 4;
                self.bytes[at..at + 4].copy_from_slice(&v.to_le_bytes());
                Ok(())
            }
            (ElementType::Int8, StoredValue::Int8(v)) => {
                self.bytes[index] = v as u8;
                Ok(())
            }
            (expected, other) => Err(TensorError::TypeMismatch {
                expected,
                found: other.element_type(),
            }),
        }
    }

    /// Overwrite the whole float32 tensor.
    pub fn store_f32(&mut self, values: &[f32]) -> Result<(), TensorError> {
        self.expect_len(ElementType::Float32, values.len())?;
        for (dst, v) in self.bytes.chunks_exact_mut(4).zip(values) {
            dst.copy_from_slice(&v.to_le_bytes());
        }
        Ok(())
    }

    /// Overwrite the whole int8 tensor.
    pub fn store_i8(&mut self, values: &[i8]) -> Result<(), TensorError> {
        self.expect_len(ElementType::Int8, values.len())?;
        for (dst, &v) in self.bytes.iter_mut().zip(values) {
            *dst = v as u8;
        }
        Ok(())
    }

    fn expect_len(&self, expected: ElementType, found: usize) -> Result<(), TensorError> {
        if self.element_type != expected {
            return Err(TensorError::TypeMismatch {
                expected,
                found: self.element_type,
            });
        }
        if self.len() != found {
            return Err(TensorError::LengthMismatch {
                expected: self.len(),
                found,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_count_is_shape_product() {
        let def = TensorDef::activation("hidden", ElementType::Float32, [1, 16]);
        assert_eq!(def.element_count(), Some(16));
        assert_eq!(def.byte_len(), Some(64));
        assert!(!def.is_constant());
    }

    #[test]
    fn element_count_overflow_is_none() {
        let def = TensorDef::activation("huge", ElementType::Float32, [u32::MAX, u32::MAX, u32::MAX]);
        assert_eq!(def.byte_len(), None);
    }

    #[test]
    fn constant_f32_encodes_little_endian() {
        let def = TensorDef::constant_f32("w", [2], &[1.0, -2.0]);
        let data = def.data.as_ref().unwrap();
        assert_eq!(&data[..4], &1.0f32.to_le_bytes());
        assert_eq!(&data[4..], &(-2.0f32).to_le_bytes());
    }

    #[test]
    fn mut_then_ref_sees_float_values() {
        let mut bytes = vec![0u8; 12];
        let mut t = TensorMut::new(ElementType::Float32, None, &mut bytes);
        t.store_f32(&[0.5, 1.5, -3.0]).unwrap();
        t.set(1, StoredValue::Float32(9.0)).unwrap();
        let r = TensorRef::new(ElementType::Float32, None, &[3], &bytes);
        assert_eq!(r.to_f32_vec().unwrap(), vec![0.5, 9.0, -3.0]);
        assert_eq!(r.get(2).unwrap(), StoredValue::Float32(-3.0));
    }

    #[test]
    fn int8_bytes_are_twos_complement() {
        let mut bytes = vec![0u8; 2];
        let mut t = TensorMut::new(ElementType::Int8, None, &mut bytes);
        t.store_i8(&[-128, 127]).unwrap();
        assert_eq!(bytes, vec![0x80, 0x7f]);
        let r = TensorRef::new(ElementType::Int8, None, &[2], &bytes);
        assert_eq!(r.to_i8_vec().unwrap(), vec![-128, 127]);
    }

    #[test]
    fn wrong_encoding_is_rejected() {
        let mut bytes = vec![0u8; 4];
        let mut t = TensorMut::new(ElementType::Float32, None, &mut bytes);
        let err = t.set(0, StoredValue::Int8(3)).unwrap_err();
        assert_eq!(
            err,
            TensorError::TypeMismatch {
                expected: ElementType::Float32,
                found: ElementType::Int8,
            }
        );
        let r = TensorRef::new(ElementType::Float32, None, &[1], &bytes);
        assert!(r.to_i8_vec().is_err());
    }

    #[test]
    fn store_rejects_wrong_length() {
        let mut bytes = vec![0u8; 8];
        let mut t = TensorMut::new(ElementType::Float32, None, &mut bytes);
        assert_eq!(
            t.store_f32(&[1.0]),
            Err(TensorError::LengthMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn get_out_of_range() {
        let bytes = [0u8; 1];
        let r = TensorRef::new(ElementType::Int8, None, &[1], &bytes);
        assert_eq!(
            r.get(1),
            Err(TensorError::IndexOutOfRange { index: 1, len: 1 })
        );
    }
}
