//! `glimmer export`

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use glimmer_model::SineEncoding;
use tracing::info;

use super::ModelChoice;
use crate::models;

/// Write the compiled-in `model` to `output`.
pub fn export(model: ModelChoice, output: &Path) -> Result<()> {
    let encoding = SineEncoding::from(model);
    let blob = models::builtin(encoding);
    fs::write(output, blob).with_context(|| format!("cannot write {}", output.display()))?;
    info!(
        model = encoding.name(),
        bytes = blob.len(),
        path = %output.display(),
        "model exported"
    );
    Ok(())
}
