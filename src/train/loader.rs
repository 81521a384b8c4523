//! Mini-batch loader over row-major datasets

use crate::autograd::{ops, ArenaId, Context, Tensor};
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Iterates `(inputs, targets)` in batches of rows
///
/// Batches are gathered with [`ops::select_rows`] into the arena passed to
/// [`DataLoader::next_batch`], normally the step arena, so they vanish with
/// the step's rollback. Incomplete trailing batches are dropped unless
/// [`with_drop_last(false)`](DataLoader::with_drop_last) is set.
///
/// With a seed the row order is reshuffled on every [`reset`](DataLoader::reset).
/// The sequence of orders depends only on the seed.
#[derive(Debug, Clone)]
pub struct DataLoader {
    inputs: Tensor,
    targets: Tensor,
    batch_size: usize,
    drop_last: bool,
    rng: Option<StdRng>,
    order: Vec<usize>,
    position: usize,
}

impl DataLoader {
    /// Sequential loader; `targets` must have one row per input row
    pub fn new(ctx: &Context, inputs: Tensor, targets: Tensor, batch_size: usize) -> Result<Self> {
        let (x, y) = (ctx.shape(inputs)?, ctx.shape(targets)?);
        if x.rows != y.rows {
            return Err(Error::ShapeMismatch {
                op: "DataLoader",
                left: x,
                right: y,
            });
        }
        if batch_size == 0 || batch_size > x.rows {
            return Err(Error::InvalidParameter(format!(
                "batch size {} must be in 1..={}",
                batch_size, x.rows
            )));
        }

        Ok(Self {
            inputs,
            targets,
            batch_size,
            drop_last: true,
            rng: None,
            order: (0..x.rows).collect(),
            position: 0,
        })
    }

    /// Shuffle rows with a generator seeded from `seed`
    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.rng = Some(StdRng::seed_from_u64(seed));
        self.reset();
        self
    }

    pub fn with_drop_last(mut self, drop_last: bool) -> Self {
        self.drop_last = drop_last;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of dataset rows
    pub fn rows(&self) -> usize {
        self.order.len()
    }

    /// Batches yielded per epoch
    pub fn num_batches(&self) -> usize {
        if self.drop_last {
            self.rows() / self.batch_size
        } else {
            self.rows().div_ceil(self.batch_size)
        }
    }

    /// Start a new epoch, reshuffling when seeded
    pub fn reset(&mut self) {
        self.order.sort_unstable();
        if let Some(rng) = self.rng.as_mut() {
            self.order.shuffle(rng);
        }
        self.position = 0;
    }

    /// Row indices of the next batch, or `None` at the end of the epoch
    pub fn next_indices(&mut self) -> Option<Vec<usize>> {
        let remaining = self.rows() - self.position;
        if remaining == 0 || (self.drop_last && remaining < self.batch_size) {
            return None;
        }
        let end = self.position + remaining.min(self.batch_size);
        let batch = self.order[self.position..end].to_vec();
        self.position = end;
        Some(batch)
    }

    /// Gather the next batch into `arena`
    pub fn next_batch(
        &mut self,
        ctx: &mut Context,
        arena: ArenaId,
    ) -> Result<Option<(Tensor, Tensor)>> {
        let Some(rows) = self.next_indices() else {
            return Ok(None);
        };
        let inputs = ops::select_rows(ctx, arena, self.inputs, &rows)?;
        let targets = ops::select_rows(ctx, arena, self.targets, &rows)?;
        Ok(Some((inputs, targets)))
    }
}
