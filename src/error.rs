//! Error types for nfnn

use crate::autograd::{ArenaId, Shape, Tensor};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Shape mismatch in {op}: left {left}, right {right}")]
    ShapeMismatch {
        op: &'static str,
        left: Shape,
        right: Shape,
    },

    #[error("Invalid shape {0}: both dimensions must be non-zero")]
    InvalidShape(Shape),

    #[error("Arena overflow: requested {requested} bytes with {used} of {capacity} bytes used")]
    ArenaOverflow {
        requested: usize,
        used: usize,
        capacity: usize,
    },

    #[error("Failed to acquire {0} bytes for arena")]
    ArenaInit(usize),

    #[error("Rollback requested with no active checkpoint")]
    NoCheckpoint,

    #[error("Stale tensor handle {0}: its arena region was reset")]
    StaleTensor(Tensor),

    #[error("Unknown arena {0}")]
    UnknownArena(ArenaId),

    #[error("Invalid axis {0} (must be 0 or 1)")]
    InvalidAxis(usize),

    #[error("{op} along axis {axis} is not implemented")]
    NotImplemented { op: &'static str, axis: usize },

    #[error("{op} requires a scalar (1, 1) tensor, got {shape}")]
    NotScalar { op: &'static str, shape: Shape },

    #[error("Operator {0} has no backward rule")]
    NoBackwardRule(&'static str),

    #[error("Invalid class target {target} at row {row} for {classes} classes")]
    InvalidTarget { row: usize, target: f32, classes: usize },

    #[error("Buffer length mismatch: expected {expected} values, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, Error>;
