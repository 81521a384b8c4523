//! Declarative YAML configuration
//!
//! # Example
//!
//! ```yaml
//! model:
//!   inputs: 2
//!   hidden: 2
//!   outputs: 1
//!   activation: sigmoid
//!   init: xor
//!
//! optimizer:
//!   name: adam
//!   lr: 0.03
//!
//! training:
//!   epochs: 250
//!   loss: mse
//!
//! output: weights.json
//! ```

mod builder;
mod cli;
mod schema;
mod train;
mod validate;



pub use builder::{build_loss, build_optimizer, build_trainer};
pub use cli::{
    apply_overrides, parse_args, Cli, Command, InfoArgs, OutputFormat, TrainArgs, ValidateArgs,
};
pub use schema::{MemorySpec, ModelSpec, OptimSpec, TrainSpec, TrainingParams};
pub use train::{load_config, read_config, run_training, train_from_yaml};
pub use validate::{validate_config, ValidationError};
