//! Execution context owning arenas and their tensor tables

use super::tensor::{Buffer, Node};
use super::{ArenaId, Op, Shape, Tensor};
use crate::arena::Arena;
use crate::{Error, Result};
use ndarray::{Array2, ArrayView2};

/// One arena plus the tensors carved from it
#[derive(Debug)]
struct Pool {
    arena: Arena,
    nodes: Vec<Node>,
    /// Tensor-table length saved with each arena checkpoint
    marks: Vec<usize>,
    generation: u32,
}

impl Pool {
    /// Drop every node past `len`. Handles to them go stale.
    fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
        self.generation = self.generation.wrapping_add(1);
    }
}

/// Context for building and differentiating computational graphs
///
/// Owns every arena and the table of tensors allocated from each of them.
/// A graph may span several arenas: operands are plain [`Tensor`] handles,
/// so a short-lived activation arena can reference long-lived parameters.
#[derive(Debug, Default)]
pub struct Context {
    pools: Vec<Pool>,
}

impl Context {
    /// Create a context with no arenas
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new arena of `capacity` bytes
    pub fn create_arena(&mut self, capacity: usize) -> Result<ArenaId> {
        let index = u32::try_from(self.pools.len())
            .map_err(|_| Error::InvalidParameter("too many arenas".to_string()))?;
        let id = ArenaId(index);

        self.pools.push(Pool {
            arena: Arena::new(capacity)?,
            nodes: Vec::new(),
            marks: Vec::new(),
            generation: 0,
        });
        log::debug!("created {} ({} bytes)", id, capacity);

        Ok(id)
    }

    fn pool(&self, id: ArenaId) -> Result<&Pool> {
        self.pools.get(id.index()).ok_or(Error::UnknownArena(id))
    }

    fn pool_mut(&mut self, id: ArenaId) -> Result<&mut Pool> {
        self.pools.get_mut(id.index()).ok_or(Error::UnknownArena(id))
    }

    /// Inspect an arena's byte accounting
    pub fn arena(&self, id: ArenaId) -> Result<&Arena> {
        Ok(&self.pool(id)?.arena)
    }

    /// Number of live tensors in an arena
    pub fn tensor_count(&self, id: ArenaId) -> Result<usize> {
        Ok(self.pool(id)?.nodes.len())
    }

    /// Save the arena offset and tensor table. Returns the checkpoint depth.
    pub fn checkpoint(&mut self, id: ArenaId) -> Result<usize> {
        let pool = self.pool_mut(id)?;
        pool.marks.push(pool.nodes.len());
        Ok(pool.arena.checkpoint())
    }

    /// Release every tensor created in the arena since its innermost checkpoint
    pub fn rollback(&mut self, id: ArenaId) -> Result<()> {
        let pool = self.pool_mut(id)?;
        let mark = pool.marks.pop().ok_or(Error::NoCheckpoint)?;
        let released = pool.nodes.len() - mark;
        pool.arena.rollback()?;
        pool.truncate(mark);

        log::debug!("rolled back {}: released {} tensors", id, released);
        Ok(())
    }

    /// Release every tensor in the arena and drop its checkpoints
    pub fn clear(&mut self, id: ArenaId) -> Result<()> {
        let pool = self.pool_mut(id)?;
        pool.arena.clear();
        pool.marks.clear();
        pool.truncate(0);

        log::debug!("cleared {}", id);
        Ok(())
    }

    pub(crate) fn node(&self, t: Tensor) -> Result<&Node> {
        self.pool(t.arena)?
            .nodes
            .get(t.slot as usize)
            .filter(|node| node.generation == t.generation)
            .ok_or(Error::StaleTensor(t))
    }

    /// Allocate a zeroed tensor and record it in the arena's table
    pub(crate) fn push_node(
        &mut self,
        arena: ArenaId,
        shape: Shape,
        requires_grad: bool,
        op: Op,
    ) -> Result<Tensor> {
        let shape = shape.validate()?;
        let pool = self.pool_mut(arena)?;

        let block = pool.arena.alloc_f32(shape.len().saturating_mul(2))?;
        let slot = u32::try_from(pool.nodes.len())
            .map_err(|_| Error::InvalidParameter("tensor table full".to_string()))?;

        pool.nodes.push(Node {
            shape,
            block,
            requires_grad,
            op,
            generation: pool.generation,
        });

        Ok(Tensor {
            arena,
            slot,
            generation: pool.generation,
        })
    }

    /// Allocate a tensor holding `values` with the given provenance
    pub(crate) fn push_array(
        &mut self,
        arena: ArenaId,
        op: Op,
        requires_grad: bool,
        values: ArrayView2<'_, f32>,
    ) -> Result<Tensor> {
        let (rows, cols) = values.dim();
        let t = self.push_node(arena, Shape::new(rows, cols), requires_grad, op)?;
        for (dst, src) in self.data_mut(t)?.iter_mut().zip(values.iter()) {
            *dst = *src;
        }
        Ok(t)
    }

    /// Allocate a zero-filled leaf tensor
    pub fn create_tensor(
        &mut self,
        arena: ArenaId,
        shape: Shape,
        requires_grad: bool,
    ) -> Result<Tensor> {
        self.push_node(arena, shape, requires_grad, Op::Leaf)
    }

    pub fn shape(&self, t: Tensor) -> Result<Shape> {
        Ok(self.node(t)?.shape)
    }

    /// Number of elements (`rows * cols`)
    pub fn len(&self, t: Tensor) -> Result<usize> {
        Ok(self.shape(t)?.len())
    }

    /// Size of one buffer of `t` in bytes
    pub fn byte_size(&self, t: Tensor) -> Result<usize> {
        Ok(self.shape(t)?.byte_size())
    }

    pub fn requires_grad(&self, t: Tensor) -> Result<bool> {
        Ok(self.node(t)?.requires_grad)
    }

    /// How `t` was produced
    pub fn op(&self, t: Tensor) -> Result<Op> {
        Ok(self.node(t)?.op)
    }

    /// Borrow one of the tensor's buffers
    pub fn buffer(&self, t: Tensor, buffer: Buffer) -> Result<&[f32]> {
        let span = self.node(t)?.span(buffer);
        self.pool(t.arena)?
            .arena
            .get(span)
            .ok_or(Error::StaleTensor(t))
    }

    /// Mutably borrow one of the tensor's buffers
    pub fn buffer_mut(&mut self, t: Tensor, buffer: Buffer) -> Result<&mut [f32]> {
        let span = self.node(t)?.span(buffer);
        self.pool_mut(t.arena)?
            .arena
            .get_mut(span)
            .ok_or(Error::StaleTensor(t))
    }

    pub fn data(&self, t: Tensor) -> Result<&[f32]> {
        self.buffer(t, Buffer::Data)
    }

    pub fn data_mut(&mut self, t: Tensor) -> Result<&mut [f32]> {
        self.buffer_mut(t, Buffer::Data)
    }

    pub fn grad(&self, t: Tensor) -> Result<&[f32]> {
        self.buffer(t, Buffer::Gradient)
    }

    pub fn grad_mut(&mut self, t: Tensor) -> Result<&mut [f32]> {
        self.buffer_mut(t, Buffer::Gradient)
    }

    /// Borrow data and gradient together, for in-place parameter updates
    pub fn data_and_grad_mut(&mut self, t: Tensor) -> Result<(&mut [f32], &[f32])> {
        let node = self.node(t)?;
        let (block, len) = (node.block, node.shape.len());
        let words = self
            .pool_mut(t.arena)?
            .arena
            .get_mut(block)
            .ok_or(Error::StaleTensor(t))?;
        let (data, grad) = words.split_at_mut(len);
        Ok((data, grad))
    }

    /// Overwrite the data buffer. `values` must have exactly `len(t)` elements.
    pub fn set_data(&mut self, t: Tensor, values: &[f32]) -> Result<()> {
        let data = self.data_mut(t)?;
        if data.len() != values.len() {
            return Err(Error::LengthMismatch {
                expected: data.len(),
                got: values.len(),
            });
        }
        data.copy_from_slice(values);
        Ok(())
    }

    /// Add `delta` into the gradient buffer of `t`
    pub fn accumulate_grad(&mut self, t: Tensor, delta: &[f32]) -> Result<()> {
        let shape = self.shape(t)?;
        let delta = ArrayView2::from_shape((shape.rows, shape.cols), delta).map_err(|_| {
            Error::LengthMismatch {
                expected: shape.len(),
                got: delta.len(),
            }
        })?;
        self.accumulate(t, delta)
    }

    pub(crate) fn accumulate(&mut self, t: Tensor, delta: ArrayView2<'_, f32>) -> Result<()> {
        let node = self.node(t)?;
        let shape = node.shape;
        let (rows, cols) = delta.dim();
        if (rows, cols) != (shape.rows, shape.cols) {
            return Err(Error::ShapeMismatch {
                op: "accumulate_grad",
                left: shape,
                right: Shape::new(rows, cols),
            });
        }
        for (g, d) in self.grad_mut(t)?.iter_mut().zip(delta.iter()) {
            *g += d;
        }
        Ok(())
    }

    /// Zero the gradient buffer of `t`
    pub fn clear_grad(&mut self, t: Tensor) -> Result<()> {
        self.grad_mut(t)?.fill(0.0);
        Ok(())
    }

    /// Read the value of a `(1, 1)` tensor
    pub fn item(&self, t: Tensor) -> Result<f32> {
        let shape = self.shape(t)?;
        if !shape.is_scalar() {
            return Err(Error::NotScalar { op: "item", shape });
        }
        self.data(t)?
            .first()
            .copied()
            .ok_or(Error::StaleTensor(t))
    }

    /// Check that two equally shaped tensors differ by at most `eps` everywhere
    pub fn all_close(&self, a: Tensor, b: Tensor, eps: f32) -> Result<bool> {
        let (left, right) = (self.shape(a)?, self.shape(b)?);
        if left != right {
            return Err(Error::ShapeMismatch {
                op: "AllClose",
                left,
                right,
            });
        }
        let close = self
            .data(a)?
            .iter()
            .zip(self.data(b)?)
            .all(|(x, y)| (x - y).abs() <= eps);
        Ok(close)
    }

    /// Plain gradient step `data -= lr * grad`, skipped unless `t` requires grad
    pub fn update(&mut self, t: Tensor, lr: f32) -> Result<()> {
        if !self.requires_grad(t)? {
            return Ok(());
        }
        let (data, grad) = self.data_and_grad_mut(t)?;
        for (x, g) in data.iter_mut().zip(grad) {
            *x -= lr * g;
        }
        Ok(())
    }

    /// Borrow the data buffer as a 2-D view
    pub fn view(&self, t: Tensor) -> Result<ArrayView2<'_, f32>> {
        self.view_of(t, Buffer::Data)
    }

    /// Borrow the gradient buffer as a 2-D view
    pub fn grad_view(&self, t: Tensor) -> Result<ArrayView2<'_, f32>> {
        self.view_of(t, Buffer::Gradient)
    }

    fn view_of(&self, t: Tensor, buffer: Buffer) -> Result<ArrayView2<'_, f32>> {
        let shape = self.shape(t)?;
        let words = self.buffer(t, buffer)?;
        ArrayView2::from_shape((shape.rows, shape.cols), words).map_err(|_| Error::StaleTensor(t))
    }

    /// Copy the data buffer out as an owned array
    pub fn to_array(&self, t: Tensor) -> Result<Array2<f32>> {
        Ok(self.view(t)?.to_owned())
    }

    /// Copy the gradient buffer out as an owned array
    pub fn grad_array(&self, t: Tensor) -> Result<Array2<f32>> {
        Ok(self.grad_view(t)?.to_owned())
    }
}
