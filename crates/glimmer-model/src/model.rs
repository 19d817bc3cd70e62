//! The decoded model graph.

use glimmer_core::{ElementType, OpCode, OpNode, TensorDef, TensorId};
use smallvec::SmallVec;
use tracing::debug;

use crate::codec::{self, ByteReader};
use crate::error::ModelError;
use crate::SCHEMA_VERSION;

/// Upper bound on preallocated table capacity while decoding.
///
/// Counts in a corrupt blob can be arbitrarily large; the tables still
/// grow as records are actually decoded.
const MAX_PREALLOC: usize = 256;

/// A validated, immutable model graph.
///
/// Nodes are stored in execution order. Constant tensors own their data,
/// so a `Model` does not borrow from the blob it was loaded from.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    schema_version: u32,
    tensors: Vec<TensorDef>,
    nodes: Vec<OpNode>,
    inputs: SmallVec<[TensorId; 2]>,
    outputs: SmallVec<[TensorId; 2]>,
}

impl Model {
    /// Read the schema version a blob declares without decoding the graph.
    ///
    /// Fails only if the blob is too short or the magic bytes are wrong.
    pub fn peek_schema_version(blob: &[u8]) -> Result<u32, ModelError> {
        codec::decode_header(&mut ByteReader::new(blob))
    }

    /// Decode and validate a model blob.
    ///
    /// The schema version is checked before any graph data is read; a
    /// mismatch yields [`ModelError::SchemaMismatch`].
    pub fn load(blob: &[u8]) -> Result<Self, ModelError> {
        let mut r = ByteReader::new(blob);
        let found = codec::decode_header(&mut r)?;
        if found != SCHEMA_VERSION {
            return Err(ModelError::SchemaMismatch {
                found,
                supported: SCHEMA_VERSION,
            });
        }

        let tensor_count = r.read_u32_le()? as usize;
        let mut tensors = Vec::with_capacity(tensor_count.min(MAX_PREALLOC));
        for _ in 0..tensor_count {
            tensors.push(codec::decode_tensor(&mut r)?);
        }
        let node_count = r.read_u32_le()? as usize;
        let mut nodes = Vec::with_capacity(node_count.min(MAX_PREALLOC));
        for _ in 0..node_count {
            nodes.push(codec::decode_node(&mut r)?);
        }
        let inputs = codec::decode_edges(&mut r)?;
        let outputs = codec::decode_edges(&mut r)?;
        if r.remaining() != 0 {
            return Err(ModelError::TrailingBytes {
                count: r.remaining(),
            });
        }

        let model = Self {
            schema_version: found,
            tensors,
            nodes,
            inputs,
            outputs,
        };
        model.validate()?;
        debug!(
            tensors = model.tensors.len(),
            nodes = model.nodes.len(),
            constant_bytes = model.constant_bytes(),
            "model loaded"
        );
        Ok(model)
    }

    /// Encode this model back into a blob.
    pub fn to_bytes(&self) -> Vec<u8> {
        encode(
            self.schema_version,
            &self.tensors,
            &self.nodes,
            &self.inputs,
            &self.outputs,
        )
    }

    /// The schema version this model was loaded with.
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// The tensor table, indexed by [`TensorId`].
    pub fn tensors(&self) -> &[TensorDef] {
        &self.tensors
    }

    /// Look up one tensor definition.
    pub fn tensor(&self, id: TensorId) -> Option<&TensorDef> {
        self.tensors.get(id.index())
    }

    /// Nodes in execution order.
    pub fn nodes(&self) -> &[OpNode] {
        &self.nodes
    }

    /// Graph input tensors.
    pub fn inputs(&self) -> &[TensorId] {
        &self.inputs
    }

    /// Graph output tensors.
    pub fn outputs(&self) -> &[TensorId] {
        &self.outputs
    }

    /// Distinct operators the graph uses, in first-use order.
    pub fn opcodes(&self) -> Vec<OpCode> {
        let mut seen = Vec::new();
        for node in &self.nodes {
            if !seen.contains(&node.opcode) {
                seen.push(node.opcode);
            }
        }
        seen
    }

    /// Total size of constant payloads in bytes.
    pub fn constant_bytes(&self) -> usize {
        self.tensors
            .iter()
            .filter_map(|t| t.data.as_ref().map(Vec::len))
            .sum()
    }

    /// Bytes the non-constant tensors need, before alignment padding.
    pub fn activation_bytes(&self) -> usize {
        self.tensors
            .iter()
            .filter(|t| !t.is_constant())
            .filter_map(TensorDef::byte_len)
            .sum()
    }

    fn validate(&self) -> Result<(), ModelError> {
        for def in &self.tensors {
            let byte_len = def.byte_len().ok_or_else(|| ModelError::InvalidTensor {
                name: def.name.clone(),
                reason: "shape overflows addressable size".to_string(),
            })?;
            if def.element_type == ElementType::Int8 && def.quant.is_none() {
                return Err(ModelError::InvalidTensor {
                    name: def.name.clone(),
                    reason: "int8 tensor has no quantization parameters".to_string(),
                });
            }
            if let Some(data) = &def.data {
                if data.len() != byte_len {
                    return Err(ModelError::InvalidTensor {
                        name: def.name.clone(),
                        reason: format!(
                            "constant holds {} bytes but shape needs {byte_len}",
                            data.len()
                        ),
                    });
                }
            }
        }

        for node in &self.nodes {
            for id in node.tensors() {
                self.checked(id)?;
            }
            for &out in &node.outputs {
                let def = self.checked(out)?;
                if def.is_constant() {
                    return Err(ModelError::InvalidGraph {
                        reason: format!("{} writes constant tensor '{}'", node.opcode, def.name),
                    });
                }
            }
        }

        if self.inputs.is_empty() || self.outputs.is_empty() {
            return Err(ModelError::InvalidGraph {
                reason: "graph must declare at least one input and one output".to_string(),
            });
        }
        for &id in self.inputs.iter().chain(&self.outputs) {
            let def = self.checked(id)?;
            if def.is_constant() {
                return Err(ModelError::InvalidGraph {
                    reason: format!("graph edge '{}' is a constant tensor", def.name),
                });
            }
        }
        Ok(())
    }

    fn checked(&self, id: TensorId) -> Result<&TensorDef, ModelError> {
        self.tensor(id).ok_or(ModelError::TensorIndexOutOfRange {
            index: id.0,
            tensor_count: self.tensors.len(),
        })
    }
}

/// Encode graph parts into a blob under the given schema version.
pub(crate) fn encode(
    schema_version: u32,
    tensors: &[TensorDef],
    nodes: &[OpNode],
    inputs: &[TensorId],
    outputs: &[TensorId],
) -> Vec<u8> {
    let mut out = Vec::new();
    codec::encode_header(&mut out, schema_version);
    codec::write_u32_le(&mut out, tensors.len() as u32);
    for def in tensors {
        codec::encode_tensor(&mut out, def);
    }
    codec::write_u32_le(&mut out, nodes.len() as u32);
    for node in nodes {
        codec::encode_node(&mut out, node);
    }
    codec::encode_edges(&mut out, inputs);
    codec::encode_edges(&mut out, outputs);
    out
}
