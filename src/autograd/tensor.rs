//! Tensor handles and the per-arena node records behind them

use super::{Op, Shape};
use crate::arena::Span;
use std::fmt;

/// Identifies one arena owned by a [`Context`](super::Context)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaId(pub(crate) u32);

impl ArenaId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "arena#{}", self.0)
    }
}

/// Handle to a tensor living in a [`Context`](super::Context)
///
/// Handles are plain indices: copying one never copies data. A handle stays
/// valid until the region of its arena that holds the tensor is rolled back
/// or cleared, after which every access reports
/// [`Error::StaleTensor`](crate::Error::StaleTensor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tensor {
    pub(crate) arena: ArenaId,
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

impl Tensor {
    /// Arena holding this tensor's buffers
    pub fn arena(&self) -> ArenaId {
        self.arena
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/t{}@g{}", self.arena, self.slot, self.generation)
    }
}

/// Selects one of the two buffers every tensor carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Buffer {
    Data,
    Gradient,
}

/// Table entry describing one tensor
///
/// `block` holds the data buffer immediately followed by the gradient.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub shape: Shape,
    pub block: Span,
    pub requires_grad: bool,
    pub op: Op,
    pub generation: u32,
}

impl Node {
    pub fn span(&self, buffer: Buffer) -> Span {
        let (data, grad) = self.block.split_at(self.shape.len());
        match buffer {
            Buffer::Data => data,
            Buffer::Gradient => grad,
        }
    }
}
