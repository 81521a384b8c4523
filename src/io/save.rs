//! Checkpoint saving

use super::format::{ModelFormat, SaveConfig};
use super::model::Model;
use crate::autograd::Context;
use crate::{Error, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Save a model's parameters to a file
///
/// # Example
///
/// ```no_run
/// use nfnn::autograd::{ops, Context, Shape};
/// use nfnn::io::{save_model, Model, ModelFormat, ModelMetadata, SaveConfig};
///
/// let mut ctx = Context::new();
/// let arena = ctx.create_arena(1024).unwrap();
/// let w = ops::from_slice(&mut ctx, arena, Shape::new(1, 2), &[1.0, 2.0], true).unwrap();
/// let model = Model::new(ModelMetadata::new("my-model", "linear"), vec![("w".to_string(), w)]);
///
/// save_model(&ctx, &model, "model.json", &SaveConfig::new(ModelFormat::Json)).unwrap();
/// ```
pub fn save_model(
    ctx: &Context,
    model: &Model,
    path: impl AsRef<Path>,
    config: &SaveConfig,
) -> Result<()> {
    let path = path.as_ref();
    let state = model.to_state(ctx)?;

    let data = match config.format {
        ModelFormat::Json => {
            if config.pretty {
                serde_json::to_string_pretty(&state)
            } else {
                serde_json::to_string(&state)
            }
            .map_err(|e| Error::Serialization(format!("JSON serialization failed: {e}")))?
        }
        ModelFormat::Yaml => serde_yaml::to_string(&state)
            .map_err(|e| Error::Serialization(format!("YAML serialization failed: {e}")))?,
    };

    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    log::info!(
        "saved {} parameters ({} values) to {}",
        state.parameters.len(),
        state.data.len(),
        path.display()
    );
    Ok(())
}
