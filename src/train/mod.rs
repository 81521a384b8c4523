//! High-level training loop
//!
//! This module provides:
//! - a two-layer perceptron whose parameters live in a persistent arena
//! - loss functions built from recorded operators
//! - a shuffling [`DataLoader`] that gathers mini-batches into the step arena
//! - a [`Trainer`] that runs each step inside a checkpoint of a scratch arena
//!
//! # Example
//!
//! ```no_run
//! use nfnn::autograd::Context;
//! use nfnn::optim::Adam;
//! use nfnn::train::{xor_dataset, Activation, MSELoss, Mlp, TrainConfig, Trainer};
//!
//! let mut ctx = Context::new();
//! let params = ctx.create_arena(1 << 20).unwrap();
//! let scratch = ctx.create_arena(1 << 20).unwrap();
//! let model = Mlp::xor(&mut ctx, params, Activation::Sigmoid).unwrap();
//! let (x, y) = xor_dataset(&mut ctx, params).unwrap();
//!
//! let mut trainer = Trainer::new(
//!     ctx,
//!     params,
//!     scratch,
//!     model,
//!     Box::new(Adam::new(0.03, 0.0, 0.0)),
//!     Box::new(MSELoss),
//!     TrainConfig::default(),
//! );
//! let result = trainer.train(x, y, 250).unwrap();
//! println!("loss {:.6} -> {:.6}", result.initial_loss, result.final_loss);
//! ```

mod config;
mod data;
mod loader;
mod loss;
mod mlp;
mod trainer;

#[cfg(test)]
mod tests;

pub use config::TrainConfig;
pub use data::{split_rows, xor_dataset};
pub use loader::DataLoader;
pub use loss::{CrossEntropyLoss, LossFn, MSELoss};
pub use mlp::{Activation, Mlp};
pub use trainer::{TrainResult, Trainer};
