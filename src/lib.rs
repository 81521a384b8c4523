//! # nfnn: arena-backed tensors with reverse-mode autograd
//!
//! nfnn provides 2-D `f32` tensors whose storage lives in bump arenas, an
//! eager operator library that records a computation graph, and a backward
//! pass that accumulates gradients into every reachable tensor.
//!
//! ## Architecture
//!
//! - **arena**: Fixed-capacity bump allocator with nested checkpoints
//! - **autograd**: Tensors, forward operators, graph ordering and backward rules
//! - **optim**: Optimizers (SGD, Adam)
//! - **io**: Tensor wire codecs and parameter checkpoints (JSON, YAML)
//! - **config**: Declarative YAML training configuration and CLI types
//! - **train**: Two-layer perceptron and the two-arena training loop

pub mod arena;
pub mod autograd;
pub mod config;
pub mod io;
pub mod optim;
pub mod train;

pub mod error;

// Re-export commonly used types
pub use autograd::{backward, ops, ArenaId, Context, Shape, Tensor};
pub use error::{Error, Result};
