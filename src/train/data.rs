//! Built-in datasets

use crate::autograd::{ops, ArenaId, Context, Shape, Tensor};
use crate::{Error, Result};

/// The four XOR rows as `(inputs, targets)`
///
/// Inputs are `(4, 2)`; targets are a `(4, 1)` column of `0.0`/`1.0` that
/// doubles as class indices. Neither requires grad.
pub fn xor_dataset(ctx: &mut Context, arena: ArenaId) -> Result<(Tensor, Tensor)> {
    let inputs = ops::from_slice(
        ctx,
        arena,
        Shape::new(4, 2),
        &[0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0],
        false,
    )?;
    let targets = ops::from_slice(ctx, arena, Shape::new(4, 1), &[0.0, 1.0, 1.0, 0.0], false)?;
    Ok((inputs, targets))
}

/// Copy rows `start..start + len` of `t` into a new leaf in `arena`
///
/// Used to carve a validation split off a dataset.
pub fn split_rows(
    ctx: &mut Context,
    arena: ArenaId,
    t: Tensor,
    start: usize,
    len: usize,
) -> Result<Tensor> {
    if len == 0 {
        return Err(Error::InvalidParameter("split must hold at least one row".to_string()));
    }
    let rows: Vec<usize> = (start..start.saturating_add(len)).collect();
    ops::select_rows(ctx, arena, t, &rows)
}
