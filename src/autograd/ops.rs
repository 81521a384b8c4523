//! Forward operator library
//!
//! Every operator validates its operand shapes, computes its result eagerly
//! into a new tensor allocated from `arena`, and records its provenance so
//! [`backward`](super::backward) can walk the graph later.

use super::{kernels, ArenaId, Context, Op, Shape, Tensor};
use crate::{Error, Result};
use ndarray::{Array2, ArrayView2};
use rand::Rng;

/// Store `values` as the output of `op`, requiring grad if any operand does
fn record(ctx: &mut Context, arena: ArenaId, op: Op, values: Array2<f32>) -> Result<Tensor> {
    let mut requires_grad = false;
    for operand in op.operands() {
        requires_grad |= ctx.requires_grad(operand)?;
    }
    ctx.push_array(arena, op, requires_grad, values.view())
}

fn same_shape(ctx: &Context, op: &'static str, left: Tensor, right: Tensor) -> Result<Shape> {
    let (l, r) = (ctx.shape(left)?, ctx.shape(right)?);
    if l != r {
        return Err(Error::ShapeMismatch {
            op,
            left: l,
            right: r,
        });
    }
    Ok(l)
}

// Leaf constructors

/// Leaf tensor filled from row-major `values`
pub fn from_slice(
    ctx: &mut Context,
    arena: ArenaId,
    shape: Shape,
    values: &[f32],
    requires_grad: bool,
) -> Result<Tensor> {
    if values.len() != shape.len() {
        return Err(Error::LengthMismatch {
            expected: shape.len(),
            got: values.len(),
        });
    }
    let t = ctx.create_tensor(arena, shape, requires_grad)?;
    ctx.set_data(t, values)?;
    Ok(t)
}

/// Leaf tensor with every element set to `value`
pub fn constant(ctx: &mut Context, arena: ArenaId, shape: Shape, value: f32) -> Result<Tensor> {
    let t = ctx.create_tensor(arena, shape, false)?;
    ctx.data_mut(t)?.fill(value);
    Ok(t)
}

pub fn ones(ctx: &mut Context, arena: ArenaId, shape: Shape) -> Result<Tensor> {
    constant(ctx, arena, shape, 1.0)
}

pub fn zeros(ctx: &mut Context, arena: ArenaId, shape: Shape) -> Result<Tensor> {
    constant(ctx, arena, shape, 0.0)
}

/// Leaf tensor with `lower + (upper - lower) / len * i` at flat index `i`
///
/// `upper` itself is never reached.
pub fn linspace(
    ctx: &mut Context,
    arena: ArenaId,
    shape: Shape,
    lower: f32,
    upper: f32,
) -> Result<Tensor> {
    let t = ctx.create_tensor(arena, shape, false)?;
    let step = (upper - lower) / shape.len() as f32;
    for (i, x) in ctx.data_mut(t)?.iter_mut().enumerate() {
        *x = lower + step * i as f32;
    }
    Ok(t)
}

/// Trainable leaf filled uniformly from `[low, high]`
pub fn uniform<R: Rng + ?Sized>(
    ctx: &mut Context,
    arena: ArenaId,
    shape: Shape,
    low: f32,
    high: f32,
    rng: &mut R,
) -> Result<Tensor> {
    if low.is_nan() || high.is_nan() || low > high {
        return Err(Error::InvalidParameter(format!(
            "uniform range [{}, {}] is empty",
            low, high
        )));
    }
    if !(high - low).is_finite() {
        return Err(Error::InvalidParameter(format!(
            "uniform range [{}, {}] is unbounded",
            low, high
        )));
    }
    let t = ctx.create_tensor(arena, shape, true)?;
    for x in ctx.data_mut(t)? {
        *x = rng.gen_range(low..=high);
    }
    Ok(t)
}

/// Gather rows of `x` into a new leaf, in the order given by `rows`
pub fn select_rows(ctx: &mut Context, arena: ArenaId, x: Tensor, rows: &[usize]) -> Result<Tensor> {
    let shape = ctx.shape(x)?;
    if let Some(&bad) = rows.iter().find(|&&r| r >= shape.rows) {
        return Err(Error::InvalidParameter(format!(
            "row {} out of range for {}",
            bad, shape
        )));
    }
    let values = ctx.view(x)?.select(ndarray::Axis(0), rows);
    ctx.push_array(arena, Op::Leaf, false, values.view())
}

// Elementwise binary ops

/// `left + right`, broadcasting `right` when its shape is `(1, 1)`, `(1, cols)` or `(rows, 1)`
pub fn add(ctx: &mut Context, arena: ArenaId, left: Tensor, right: Tensor) -> Result<Tensor> {
    let (l, r) = (ctx.shape(left)?, ctx.shape(right)?);
    if l == r {
        let values = kernels::add(ctx.view(left)?, ctx.view(right)?);
        record(ctx, arena, Op::Add { left, right }, values)
    } else if l.broadcastable(&r) {
        let values = kernels::add(ctx.view(left)?, ctx.view(right)?);
        record(ctx, arena, Op::BroadcastAdd { left, right }, values)
    } else {
        Err(Error::ShapeMismatch {
            op: "Add",
            left: l,
            right: r,
        })
    }
}

pub fn sub(ctx: &mut Context, arena: ArenaId, left: Tensor, right: Tensor) -> Result<Tensor> {
    same_shape(ctx, "Sub", left, right)?;
    let values = kernels::sub(ctx.view(left)?, ctx.view(right)?);
    record(ctx, arena, Op::Sub { left, right }, values)
}

/// Elementwise (Hadamard) product
pub fn mul(ctx: &mut Context, arena: ArenaId, left: Tensor, right: Tensor) -> Result<Tensor> {
    same_shape(ctx, "Mul", left, right)?;
    let values = kernels::mul(ctx.view(left)?, ctx.view(right)?);
    record(ctx, arena, Op::Mul { left, right }, values)
}

/// Matrix product; `left.cols` must equal `right.rows`
pub fn matmul(ctx: &mut Context, arena: ArenaId, left: Tensor, right: Tensor) -> Result<Tensor> {
    let (l, r) = (ctx.shape(left)?, ctx.shape(right)?);
    if l.cols != r.rows {
        return Err(Error::ShapeMismatch {
            op: "MatMul",
            left: l,
            right: r,
        });
    }
    let values = kernels::matmul(ctx.view(left)?, ctx.view(right)?);
    record(ctx, arena, Op::MatMul { left, right }, values)
}

// Activations

fn unary(
    ctx: &mut Context,
    arena: ArenaId,
    op: Op,
    input: Tensor,
    kernel: fn(ArrayView2<'_, f32>) -> Array2<f32>,
) -> Result<Tensor> {
    let values = kernel(ctx.view(input)?);
    record(ctx, arena, op, values)
}

pub fn relu(ctx: &mut Context, arena: ArenaId, input: Tensor) -> Result<Tensor> {
    unary(ctx, arena, Op::Relu { input }, input, kernels::relu)
}

pub fn sigmoid(ctx: &mut Context, arena: ArenaId, input: Tensor) -> Result<Tensor> {
    unary(ctx, arena, Op::Sigmoid { input }, input, kernels::sigmoid)
}

pub fn tanh(ctx: &mut Context, arena: ArenaId, input: Tensor) -> Result<Tensor> {
    unary(ctx, arena, Op::Tanh { input }, input, kernels::tanh)
}

pub fn square(ctx: &mut Context, arena: ArenaId, input: Tensor) -> Result<Tensor> {
    unary(ctx, arena, Op::Square { input }, input, kernels::square)
}

// Losses

/// Log of the softmax along `axis`. Only `axis = 1` (per row) is supported.
pub fn log_softmax(ctx: &mut Context, arena: ArenaId, input: Tensor, axis: usize) -> Result<Tensor> {
    match axis {
        1 => unary(
            ctx,
            arena,
            Op::LogSoftmax { input, axis },
            input,
            kernels::log_softmax_rows,
        ),
        0 => Err(Error::NotImplemented {
            op: "LogSoftmax",
            axis,
        }),
        _ => Err(Error::InvalidAxis(axis)),
    }
}

/// Mean negative log-likelihood of `target` classes under log-probabilities `input`
///
/// `target` holds one float-encoded class index per row of `input`, in any
/// orientation. The result is `(1, 1)`.
pub fn nll_loss(ctx: &mut Context, arena: ArenaId, input: Tensor, target: Tensor) -> Result<Tensor> {
    let shape = ctx.shape(input)?;
    let classes = kernels::class_indices(ctx.data(target)?, shape.rows, shape.cols)?;
    let loss = kernels::nll_loss(ctx.view(input)?, &classes);
    record(
        ctx,
        arena,
        Op::NllLoss { input, target },
        Array2::from_elem((1, 1), loss),
    )
}

/// Half the mean squared error, `0.5 / rows * sum((x - y)^2)`
///
/// Built from differentiable ops so gradients flow back into `x` and `y`.
pub fn mse_loss(ctx: &mut Context, arena: ArenaId, x: Tensor, y: Tensor) -> Result<Tensor> {
    let rows = same_shape(ctx, "MSELoss", x, y)?.rows;
    let diff = sub(ctx, arena, x, y)?;
    let squared = square(ctx, arena, diff)?;
    let total = sum_all(ctx, arena, squared)?;
    let factor = constant(ctx, arena, Shape::SCALAR, 0.5 / rows as f32)?;
    mul(ctx, arena, total, factor)
}

// Reductions

/// Sum along `axis` via a matrix product with a ones vector
///
/// Axis 0 gives `(1, cols)`, axis 1 gives `(rows, 1)`.
pub fn sum(ctx: &mut Context, arena: ArenaId, x: Tensor, axis: usize) -> Result<Tensor> {
    let shape = ctx.shape(x)?;
    match axis {
        0 => {
            let ones = ones(ctx, arena, Shape::new(1, shape.rows))?;
            matmul(ctx, arena, ones, x)
        }
        1 => {
            let ones = ones(ctx, arena, Shape::new(shape.cols, 1))?;
            matmul(ctx, arena, x, ones)
        }
        _ => Err(Error::InvalidAxis(axis)),
    }
}

/// Sum of every element as a `(1, 1)` tensor
pub fn sum_all(ctx: &mut Context, arena: ArenaId, x: Tensor) -> Result<Tensor> {
    let columns = sum(ctx, arena, x, 0)?;
    sum(ctx, arena, columns, 1)
}

/// Column of per-row argmax indices. Ties go to the lowest index.
pub fn argmax(ctx: &mut Context, arena: ArenaId, x: Tensor, axis: usize) -> Result<Tensor> {
    match axis {
        1 => {
            let values = kernels::argmax_rows(ctx.view(x)?);
            ctx.push_array(arena, Op::Leaf, false, values.view())
        }
        0 => Err(Error::NotImplemented { op: "Argmax", axis }),
        _ => Err(Error::InvalidAxis(axis)),
    }
}

/// `1.0` where `|a - b| < eps`, `0.0` elsewhere
pub fn equal(ctx: &mut Context, arena: ArenaId, a: Tensor, b: Tensor, eps: f32) -> Result<Tensor> {
    same_shape(ctx, "Equal", a, b)?;
    let values = kernels::equal(ctx.view(a)?, ctx.view(b)?, eps);
    ctx.push_array(arena, Op::Leaf, false, values.view())
}

// Ops without a backward rule

pub fn copy(ctx: &mut Context, arena: ArenaId, input: Tensor) -> Result<Tensor> {
    let values = ctx.to_array(input)?;
    record(ctx, arena, Op::Copy { input }, values)
}

/// Reinterpret the row-major data of `input` as `shape`
pub fn reshape(ctx: &mut Context, arena: ArenaId, input: Tensor, shape: Shape) -> Result<Tensor> {
    let current = ctx.shape(input)?;
    let shape = shape.validate()?;
    if current.len() != shape.len() {
        return Err(Error::ShapeMismatch {
            op: "Reshape",
            left: current,
            right: shape,
        });
    }
    let values = ArrayView2::from_shape((shape.rows, shape.cols), ctx.data(input)?)
        .map_err(|_| Error::InvalidShape(shape))?
        .to_owned();
    record(ctx, arena, Op::Reshape { input }, values)
}

pub fn mul_by_constant(
    ctx: &mut Context,
    arena: ArenaId,
    input: Tensor,
    factor: f32,
) -> Result<Tensor> {
    let values = kernels::scale(ctx.view(input)?, factor);
    record(ctx, arena, Op::MulByConstant { input, factor }, values)
}
