//! Programmatic model construction.

use glimmer_core::{OpNode, TensorDef, TensorId};
use smallvec::SmallVec;

use crate::error::ModelError;
use crate::model::{encode, Model};
use crate::SCHEMA_VERSION;

/// Assembles a model graph and writes it as a blob.
///
/// The builder performs no validation of its own: [`build`](Self::build)
/// encodes and re-loads the graph, so anything the builder produces is
/// held to exactly the rules a blob from disk is.
///
/// # Example
///
/// ```
/// use glimmer_core::{ElementType, OpCode, OpNode, TensorDef};
/// use glimmer_model::ModelBuilder;
///
/// let mut b = ModelBuilder::new();
/// let x = b.add_tensor(TensorDef::activation("x", ElementType::Float32, [1, 4]));
/// let y = b.add_tensor(TensorDef::activation("y", ElementType::Float32, [1, 4]));
/// b.add_node(OpNode::new(OpCode::Relu, [Some(x)], [y]));
/// b.set_inputs([x]).set_outputs([y]);
///
/// let model = b.build().unwrap();
/// assert_eq!(model.nodes().len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct ModelBuilder {
    schema_version: u32,
    tensors: Vec<TensorDef>,
    nodes: Vec<OpNode>,
    inputs: SmallVec<[TensorId; 2]>,
    outputs: SmallVec<[TensorId; 2]>,
}

impl ModelBuilder {
    /// An empty graph targeting the current [`SCHEMA_VERSION`].
    pub fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            tensors: Vec::new(),
            nodes: Vec::new(),
            inputs: SmallVec::new(),
            outputs: SmallVec::new(),
        }
    }

    /// Override the schema version written into the header.
    pub fn with_schema_version(&mut self, version: u32) -> &mut Self {
        self.schema_version = version;
        self
    }

    /// Append a tensor and return its id.
    pub fn add_tensor(&mut self, def: TensorDef) -> TensorId {
        let id = TensorId(self.tensors.len() as u32);
        self.tensors.push(def);
        id
    }

    /// Append a node. Nodes run in the order they are added.
    pub fn add_node(&mut self, node: OpNode) -> &mut Self {
        self.nodes.push(node);
        self
    }

    /// Declare the graph inputs.
    pub fn set_inputs(&mut self, ids: impl IntoIterator<Item = TensorId>) -> &mut Self {
        self.inputs = ids.into_iter().collect();
        self
    }

    /// Declare the graph outputs.
    pub fn set_outputs(&mut self, ids: impl IntoIterator<Item = TensorId>) -> &mut Self {
        self.outputs = ids.into_iter().collect();
        self
    }

    /// Mutable access to a tensor already added, for fixture tweaks.
    pub fn tensor_mut(&mut self, id: TensorId) -> Option<&mut TensorDef> {
        self.tensors.get_mut(id.index())
    }

    /// Encode the graph as a blob, unvalidated.
    pub fn to_bytes(&self) -> Vec<u8> {
        encode(
            self.schema_version,
            &self.tensors,
            &self.nodes,
            &self.inputs,
            &self.outputs,
        )
    }

    /// Encode and load the graph, applying every load-time check.
    pub fn build(&self) -> Result<Model, ModelError> {
        Model::load(&self.to_bytes())
    }
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}
