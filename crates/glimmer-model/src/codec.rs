//! Binary encode/decode for the model format.
//!
//! Record layouts, in order of appearance:
//!
//! ```text
//! Tensor: name:str  element_type:u8  rank:u8  dims:u32*rank
//!         quant_flag:u8 [scale:f32 zero_point:i32]
//!         data_flag:u8  [len:u32 bytes]
//! Node:   opcode:u8  activation:u8
//!         n_in:u8  in:i32*n_in      (-1 marks an absent optional input)
//!         n_out:u8 out:u32*n_out
//! ```
//!
//! Writers append to a `Vec<u8>` and cannot fail. Readers work over a
//! borrowed slice and report the byte offset at which data ran out.

use glimmer_core::{
    Activation, ElementType, OpCode, OpNode, QuantParams, Shape, TensorDef, TensorId,
};
use smallvec::SmallVec;

use crate::error::ModelError;
use crate::MAGIC;

// ── Primitive writers ───────────────────────────────────────────

/// Append a single byte.
pub fn write_u8(out: &mut Vec<u8>, v: u8) {
    out.push(v);
}

/// Append a little-endian u32.
pub fn write_u32_le(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Append a little-endian i32.
pub fn write_i32_le(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Append a little-endian f32.
pub fn write_f32_le(out: &mut Vec<u8>, v: f32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Append a length-prefixed byte array (u32 length + bytes).
pub fn write_length_prefixed_bytes(out: &mut Vec<u8>, b: &[u8]) {
    write_u32_le(out, b.len() as u32);
    out.extend_from_slice(b);
}

/// Append a length-prefixed UTF-8 string.
pub fn write_length_prefixed_str(out: &mut Vec<u8>, s: &str) {
    write_length_prefixed_bytes(out, s.as_bytes());
}

// ── Primitive readers ───────────────────────────────────────────

/// Cursor over a borrowed blob.
#[derive(Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Start reading at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current byte offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Consume exactly `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], ModelError> {
        if self.remaining() < n {
            return Err(ModelError::Truncated {
                offset: self.pos,
                needed: n,
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], ModelError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, ModelError> {
        Ok(self.take(1)?[0])
    }

    /// Read a little-endian u32.
    pub fn read_u32_le(&mut self) -> Result<u32, ModelError> {
        self.array().map(u32::from_le_bytes)
    }

    /// Read a little-endian i32.
    pub fn read_i32_le(&mut self) -> Result<i32, ModelError> {
        self.array().map(i32::from_le_bytes)
    }

    /// Read a little-endian f32.
    pub fn read_f32_le(&mut self) -> Result<f32, ModelError> {
        self.array().map(f32::from_le_bytes)
    }

    /// Read a length-prefixed byte array.
    pub fn read_length_prefixed_bytes(&mut self) -> Result<&'a [u8], ModelError> {
        let len = self.read_u32_le()? as usize;
        self.take(len)
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_length_prefixed_str(&mut self) -> Result<String, ModelError> {
        let bytes = self.read_length_prefixed_bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|e| ModelError::Malformed {
            detail: format!("invalid UTF-8 string: {e}"),
        })
    }
}

// ── Header ──────────────────────────────────────────────────────

/// Append the magic bytes and schema version.
pub fn encode_header(out: &mut Vec<u8>, schema_version: u32) {
    out.extend_from_slice(&MAGIC);
    write_u32_le(out, schema_version);
}

/// Read and check the magic bytes, then return the declared schema version.
///
/// The version is returned as found; the caller decides whether it is
/// acceptable.
pub fn decode_header(r: &mut ByteReader<'_>) -> Result<u32, ModelError> {
    let magic: [u8; 4] = r.array()?;
    if magic != MAGIC {
        return Err(ModelError::InvalidMagic { found: magic });
    }
    r.read_u32_le()
}

// ── Tensors ─────────────────────────────────────────────────────

/// Append one tensor record.
pub fn encode_tensor(out: &mut Vec<u8>, def: &TensorDef) {
    write_length_prefixed_str(out, &def.name);
    write_u8(out, def.element_type.tag());
    write_u8(out, def.shape.len() as u8);
    for &d in &def.shape {
        write_u32_le(out, d);
    }
    match def.quant {
        Some(q) => {
            write_u8(out, 1);
            write_f32_le(out, q.scale());
            write_i32_le(out, q.zero_point());
        }
        None => write_u8(out, 0),
    }
    match &def.data {
        Some(bytes) => {
            write_u8(out, 1);
            write_length_prefixed_bytes(out, bytes);
        }
        None => write_u8(out, 0),
    }
}

/// Read one tensor record.
pub fn decode_tensor(r: &mut ByteReader<'_>) -> Result<TensorDef, ModelError> {
    let name = r.read_length_prefixed_str()?;
    let tag = r.read_u8()?;
    let element_type = ElementType::from_tag(tag).ok_or_else(|| ModelError::Malformed {
        detail: format!("tensor '{name}': unknown element type tag {tag}"),
    })?;
    let rank = r.read_u8()? as usize;
    let mut shape = Shape::with_capacity(rank);
    for _ in 0..rank {
        shape.push(r.read_u32_le()?);
    }
    let quant = match r.read_u8()? {
        0 => None,
        1 => {
            let scale = r.read_f32_le()?;
            let zero_point = r.read_i32_le()?;
            Some(QuantParams::new(scale, zero_point).map_err(|e| ModelError::tensor(&name, e))?)
        }
        flag => {
            return Err(ModelError::Malformed {
                detail: format!("tensor '{name}': invalid quantization flag {flag}"),
            })
        }
    };
    let data = match r.read_u8()? {
        0 => None,
        1 => Some(r.read_length_prefixed_bytes()?.to_vec()),
        flag => {
            return Err(ModelError::Malformed {
                detail: format!("tensor '{name}': invalid data flag {flag}"),
            })
        }
    };
    Ok(TensorDef {
        name,
        element_type,
        shape,
        quant,
        data,
    })
}

// ── Nodes ───────────────────────────────────────────────────────

/// Append one node record.
pub fn encode_node(out: &mut Vec<u8>, node: &OpNode) {
    write_u8(out, node.opcode.tag());
    write_u8(out, node.activation.tag());
    write_u8(out, node.inputs.len() as u8);
    for input in &node.inputs {
        write_i32_le(out, input.map_or(-1, |id| id.0 as i32));
    }
    write_u8(out, node.outputs.len() as u8);
    for output in &node.outputs {
        write_u32_le(out, output.0);
    }
}

/// Read one node record.
pub fn decode_node(r: &mut ByteReader<'_>) -> Result<OpNode, ModelError> {
    let tag = r.read_u8()?;
    let opcode = OpCode::from_tag(tag).ok_or_else(|| ModelError::Malformed {
        detail: format!("unknown opcode tag {tag}"),
    })?;
    let tag = r.read_u8()?;
    let activation = Activation::from_tag(tag).ok_or_else(|| ModelError::Malformed {
        detail: format!("{opcode}: unknown activation tag {tag}"),
    })?;
    let n_in = r.read_u8()? as usize;
    let mut inputs = SmallVec::with_capacity(n_in);
    for _ in 0..n_in {
        let raw = r.read_i32_le()?;
        let slot = match raw {
            -1 => None,
            i if i >= 0 => Some(TensorId(i as u32)),
            other => {
                return Err(ModelError::Malformed {
                    detail: format!("{opcode}: negative input index {other}"),
                })
            }
        };
        inputs.push(slot);
    }
    let n_out = r.read_u8()? as usize;
    let mut outputs = SmallVec::with_capacity(n_out);
    for _ in 0..n_out {
        outputs.push(TensorId(r.read_u32_le()?));
    }
    Ok(OpNode {
        opcode,
        activation,
        inputs,
        outputs,
    })
}

// ── Graph edges ─────────────────────────────────────────────────

/// Append a u8-counted list of tensor indices.
pub fn encode_edges(out: &mut Vec<u8>, ids: &[TensorId]) {
    write_u8(out, ids.len() as u8);
    for id in ids {
        write_u32_le(out, id.0);
    }
}

/// Read a u8-counted list of tensor indices.
pub fn decode_edges(r: &mut ByteReader<'_>) -> Result<SmallVec<[TensorId; 2]>, ModelError> {
    let n = r.read_u8()? as usize;
    let mut ids = SmallVec::with_capacity(n);
    for _ in 0..n {
        ids.push(TensorId(r.read_u32_le()?));
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_reports_truncation_offset() {
        let mut r = ByteReader::new(&[1, 2, 3]);
        assert_eq!(r.read_u8().unwrap(), 1);
        match r.read_u32_le() {
            Err(ModelError::Truncated { offset, needed }) => {
                assert_eq!(offset, 1);
                assert_eq!(needed, 4);
            }
            other => panic!("expected Truncated, got {other:?}"),
        }
        // A failed read consumes nothing.
        assert_eq!(r.remaining(), 2);
    }

    #[test]
    fn header_rejects_wrong_magic() {
        let mut buf = b"TFL3".to_vec();
        write_u32_le(&mut buf, 3);
        let err = decode_header(&mut ByteReader::new(&buf)).unwrap_err();
        assert!(matches!(err, ModelError::InvalidMagic { found } if &found == b"TFL3"));
    }

    #[test]
    fn header_returns_declared_version() {
        let mut buf = Vec::new();
        encode_header(&mut buf, 42);
        assert_eq!(decode_header(&mut ByteReader::new(&buf)).unwrap(), 42);
    }

    #[test]
    fn tensor_record_round_trips() {
        let def = TensorDef::activation("input", ElementType::Int8, [1, 1])
            .with_quant(QuantParams::new(0.0246, -128).unwrap());
        let mut buf = Vec::new();
        encode_tensor(&mut buf, &def);
        let mut r = ByteReader::new(&buf);
        assert_eq!(decode_tensor(&mut r).unwrap(), def);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn tensor_with_bad_quant_is_rejected() {
        let mut buf = Vec::new();
        write_length_prefixed_str(&mut buf, "x");
        write_u8(&mut buf, ElementType::Int8.tag());
        write_u8(&mut buf, 0);
        write_u8(&mut buf, 1);
        write_f32_le(&mut buf, 0.0);
        write_i32_le(&mut buf, 0);
        write_u8(&mut buf, 0);
        let err = decode_tensor(&mut ByteReader::new(&buf)).unwrap_err();
        assert!(matches!(err, ModelError::InvalidTensor { ref name, .. } if name == "x"));
    }

    #[test]
    fn node_absent_input_round_trips() {
        let node = OpNode::new(
            OpCode::FullyConnected,
            [Some(TensorId(1)), Some(TensorId(2)), None],
            [TensorId(3)],
        )
        .with_activation(Activation::Relu);
        let mut buf = Vec::new();
        encode_node(&mut buf, &node);
        assert_eq!(decode_node(&mut ByteReader::new(&buf)).unwrap(), node);
    }

    #[test]
    fn unknown_opcode_is_malformed() {
        let buf = [9u8, 0, 0, 0];
        let err = decode_node(&mut ByteReader::new(&buf)).unwrap_err();
        assert!(matches!(err, ModelError::Malformed { .. }));
    }
}
