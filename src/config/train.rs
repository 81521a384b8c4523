//! Single-command training from YAML configuration

use super::builder::build_trainer;
use super::schema::TrainSpec;
use super::validate::validate_config;
use crate::error::{Error, Result};
use crate::io::{save_model, ModelFormat, SaveConfig};
use crate::train::{DataLoader, TrainResult};
use std::fs;
use std::path::Path;

/// Parse a training spec without validating it
///
/// Lets callers apply overrides before [`validate_config`] runs.
pub fn read_config<P: AsRef<Path>>(config_path: P) -> Result<TrainSpec> {
    let yaml_content = fs::read_to_string(config_path.as_ref()).map_err(|e| {
        Error::ConfigError(format!(
            "Failed to read config file {}: {}",
            config_path.as_ref().display(),
            e
        ))
    })?;

    serde_yaml::from_str(&yaml_content)
        .map_err(|e| Error::ConfigError(format!("Failed to parse YAML config: {}", e)))
}

/// Load and validate a training spec from a YAML file (without running training)
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<TrainSpec> {
    let spec = read_config(config_path)?;
    validate_config(&spec).map_err(|e| Error::ConfigError(format!("Invalid config: {}", e)))?;
    Ok(spec)
}

/// Train on XOR as described by an already validated spec
///
/// Writes a parameter checkpoint when `spec.output` is set; its format
/// follows the file extension and defaults to JSON.
pub fn run_training(spec: &TrainSpec) -> Result<TrainResult> {
    let (mut trainer, inputs, targets) = build_trainer(spec)?;
    log::debug!(
        "training {}-{}-{} {} with {} (lr={}) for {} epochs",
        spec.model.inputs,
        spec.model.hidden,
        spec.model.outputs,
        spec.model.activation,
        spec.optimizer.name,
        spec.optimizer.lr,
        spec.training.epochs
    );

    let result = match spec.training.batch_size {
        Some(batch_size) => {
            let mut loader = DataLoader::new(trainer.ctx(), inputs, targets, batch_size)?
                .with_shuffle(spec.training.seed);
            trainer.train_batched(&mut loader, spec.training.epochs)?
        }
        None => trainer.train(inputs, targets, spec.training.epochs)?,
    };
    let accuracy = trainer.accuracy(inputs, targets)?;
    log::info!(
        "final loss {:.6} (initial {:.6}), accuracy {:.2}",
        result.final_loss,
        result.initial_loss,
        accuracy
    );

    if let Some(path) = &spec.output {
        let format = ModelFormat::from_path(path).unwrap_or(ModelFormat::Json);
        let model = trainer.model().to_model(trainer.ctx(), "xor")?;
        save_model(trainer.ctx(), &model, path, &SaveConfig::new(format))?;
    }

    Ok(result)
}

/// Train a model from YAML configuration file
///
/// Loads and validates the config, builds the model and optimizer, runs the
/// training loop and saves the final parameters if an output path is set.
///
/// # Example
///
/// ```no_run
/// use nfnn::config::train_from_yaml;
///
/// let result = train_from_yaml("xor.yaml")?;
/// println!("final loss {}", result.final_loss);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn train_from_yaml<P: AsRef<Path>>(config_path: P) -> Result<TrainResult> {
    let spec = load_config(config_path)?;
    run_training(&spec)
}
