//! `glimmer info`

use anyhow::Result;
use glimmer_core::TensorDef;
use glimmer_model::Model;

use super::ModelArgs;

/// Print a model's header, tensor table, and operator list.
pub fn info(args: &ModelArgs) -> Result<()> {
    let blob = args.load()?;
    let model = Model::load(&blob)?;
    print!("{}", describe(&args.describe(), &model));
    Ok(())
}

fn describe(name: &str, model: &Model) -> String {
    let mut out = format!("Model: {name}\n");
    out += &format!("Schema version: {}\n", model.schema_version());
    out += &format!(
        "Arena: {} activation bytes, {} constant bytes\n\n",
        model.activation_bytes(),
        model.constant_bytes()
    );

    out += &format!("Tensors ({}):\n", model.tensors().len());
    for (id, def) in model.tensors().iter().enumerate() {
        out += &format!("  {id:>2} {}\n", tensor_line(def));
    }

    out += &format!("\nOperators ({}):\n", model.nodes().len());
    for (index, node) in model.nodes().iter().enumerate() {
        let inputs: Vec<String> = node
            .inputs
            .iter()
            .map(|i| i.map_or_else(|| "-".to_string(), |id| id.to_string()))
            .collect();
        let outputs: Vec<String> = node.outputs.iter().map(|id| id.to_string()).collect();
        out += &format!(
            "  {index:>2} {:<16} [{}] -> [{}] activation={:?}\n",
            node.opcode.name(),
            inputs.join(", "),
            outputs.join(", "),
            node.activation
        );
    }

    let io = |ids: &[glimmer_core::TensorId]| {
        ids.iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    out += &format!(
        "\nInputs: [{}]  Outputs: [{}]\n",
        io(model.inputs()),
        io(model.outputs())
    );
    out
}

fn tensor_line(def: &TensorDef) -> String {
    let kind = if def.is_constant() { "const" } else { "act" };
    let quant = def
        .quant
        .map(|q| format!(" scale={} zero_point={}", q.scale(), q.zero_point()))
        .unwrap_or_default();
    format!(
        "{:<16} {:<7} {:?} {kind}{quant}",
        def.name, def.element_type.to_string(), def.shape
    )
}
