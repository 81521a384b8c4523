//! Checkpoint loading

use super::format::ModelFormat;
use super::model::{Model, ModelState};
use crate::autograd::{ArenaId, Context};
use crate::{Error, Result};
use std::fs;
use std::path::Path;

/// Read a checkpoint without touching any context
///
/// The format is detected from the file extension.
pub fn load_state(path: impl AsRef<Path>) -> Result<ModelState> {
    let path = path.as_ref();

    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Serialization("File has no extension".to_string()))?;
    let format = ModelFormat::from_extension(ext)
        .ok_or_else(|| Error::Serialization(format!("Unsupported file extension: {ext}")))?;

    let content = fs::read_to_string(path)?;
    let state = match format {
        ModelFormat::Json => serde_json::from_str(&content)
            .map_err(|e| Error::Serialization(format!("JSON deserialization failed: {e}")))?,
        ModelFormat::Yaml => serde_yaml::from_str(&content)
            .map_err(|e| Error::Serialization(format!("YAML deserialization failed: {e}")))?,
    };
    Ok(state)
}

/// Load a checkpoint into fresh leaf tensors allocated from `arena`
///
/// # Example
///
/// ```no_run
/// use nfnn::autograd::Context;
/// use nfnn::io::load_model;
///
/// let mut ctx = Context::new();
/// let arena = ctx.create_arena(1 << 16).unwrap();
/// let model = load_model(&mut ctx, arena, "model.json").unwrap();
/// println!("Loaded model: {}", model.metadata.name);
/// ```
pub fn load_model(ctx: &mut Context, arena: ArenaId, path: impl AsRef<Path>) -> Result<Model> {
    let state = load_state(path)?;
    Model::from_state(ctx, arena, state)
}
