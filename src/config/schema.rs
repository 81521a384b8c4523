//! YAML schema definitions for declarative training configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Complete training specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainSpec {
    /// Network shape
    pub model: ModelSpec,

    /// Optimizer configuration
    pub optimizer: OptimSpec,

    /// Training hyperparameters
    #[serde(default)]
    pub training: TrainingParams,

    /// Arena sizes
    #[serde(default)]
    pub memory: MemorySpec,

    /// Optional parameter checkpoint written after training
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

/// Two-layer perceptron shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Features per input row
    pub inputs: usize,

    /// Hidden layer width
    pub hidden: usize,

    /// Output width
    pub outputs: usize,

    /// Hidden activation: "relu" | "sigmoid" | "tanh"
    #[serde(default = "default_activation")]
    pub activation: String,

    /// Initialization: "uniform" (seeded) | "xor" (fixed 2-2-1 weights)
    #[serde(default = "default_init")]
    pub init: String,
}

/// Optimizer specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimSpec {
    /// Optimizer name: "adam" | "sgd"
    pub name: String,

    /// Learning rate
    pub lr: f32,

    /// Optimizer-specific parameters (beta1, beta2, momentum, etc.)
    #[serde(flatten)]
    pub params: HashMap<String, serde_json::Value>,
}

impl OptimSpec {
    /// Numeric optimizer parameter, or `default` when absent
    pub fn param(&self, key: &str, default: f32) -> f32 {
        self.params
            .get(key)
            .and_then(|v| v.as_f64())
            .map_or(default, |v| v as f32)
    }

    /// Boolean optimizer parameter, or `false` when absent
    pub fn flag(&self, key: &str) -> bool {
        self.params
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// Training hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingParams {
    /// Number of passes over the dataset
    #[serde(default = "default_epochs")]
    pub epochs: usize,

    /// Seed for parameter initialization
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Loss: "mse" | "nll"
    #[serde(default = "default_loss")]
    pub loss: String,

    /// Log the loss every N epochs (0 disables)
    #[serde(default = "default_log_interval")]
    pub log_interval: usize,

    /// Rows per mini-batch, shuffled with `seed`; full batch when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            seed: default_seed(),
            loss: default_loss(),
            log_interval: default_log_interval(),
            batch_size: None,
        }
    }
}

/// Capacities of the two arenas, in bytes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySpec {
    /// Parameters, optimizer inputs and the dataset
    #[serde(default = "default_arena_bytes")]
    pub parameter_arena_bytes: usize,

    /// Per-step graphs, rolled back after every step
    #[serde(default = "default_arena_bytes")]
    pub step_arena_bytes: usize,
}

impl Default for MemorySpec {
    fn default() -> Self {
        Self {
            parameter_arena_bytes: default_arena_bytes(),
            step_arena_bytes: default_arena_bytes(),
        }
    }
}

fn default_activation() -> String {
    "sigmoid".to_string()
}

fn default_init() -> String {
    "uniform".to_string()
}

fn default_epochs() -> usize {
    250
}

fn default_seed() -> u64 {
    41423
}

fn default_loss() -> String {
    "mse".to_string()
}

fn default_log_interval() -> usize {
    25
}

fn default_arena_bytes() -> usize {
    1 << 20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let yaml = r#"
model:
  inputs: 2
  hidden: 2
  outputs: 1

optimizer:
  name: adam
  lr: 0.03
"#;

        let spec: TrainSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.model.hidden, 2);
        assert_eq!(spec.model.activation, "sigmoid");
        assert_eq!(spec.model.init, "uniform");
        assert_eq!(spec.optimizer.name, "adam");
        assert_eq!(spec.optimizer.lr, 0.03);
        assert_eq!(spec.training, TrainingParams::default());
        assert_eq!(spec.memory, MemorySpec::default());
        assert!(spec.output.is_none());
    }

    #[test]
    fn test_deserialize_full_config() {
        let yaml = r#"
model:
  inputs: 2
  hidden: 8
  outputs: 2
  activation: tanh
  init: uniform

optimizer:
  name: sgd
  lr: 0.1
  momentum: 0.9
  nesterov: true

training:
  epochs: 500
  seed: 7
  loss: nll
  log_interval: 0

memory:
  parameter_arena_bytes: 65536
  step_arena_bytes: 131072

output: weights.yaml
"#;

        let spec: TrainSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.optimizer.param("momentum", 0.0), 0.9);
        assert_eq!(spec.optimizer.param("dampening", 0.25), 0.25);
        assert!(spec.optimizer.flag("nesterov"));
        assert_eq!(spec.training.loss, "nll");
        assert_eq!(spec.training.seed, 7);
        assert_eq!(spec.memory.step_arena_bytes, 131072);
        assert_eq!(spec.output, Some(PathBuf::from("weights.yaml")));
    }

    #[test]
    fn test_default_training_params() {
        let params = TrainingParams::default();
        assert_eq!(params.epochs, 250);
        assert_eq!(params.seed, 41423);
        assert_eq!(params.loss, "mse");
        assert_eq!(params.log_interval, 25);
    }
}
