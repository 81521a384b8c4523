//! Reverse-mode gradient accumulation

use super::{build_list, kernels, Context, Op, Tensor};
use crate::{Error, Result};

/// Backpropagate from a scalar `root` into every reachable tensor.
///
/// Gradients are accumulated with `+=`, so callers reset them with
/// [`zero_grad`] (or an optimizer's `zero_grad`) between steps. If any
/// reachable operator lacks a backward rule the call fails before touching a
/// gradient buffer.
pub fn backward(ctx: &mut Context, root: Tensor) -> Result<()> {
    let shape = ctx.shape(root)?;
    if !shape.is_scalar() {
        return Err(Error::NotScalar {
            op: "backward",
            shape,
        });
    }

    let order = build_list(ctx, root)?;
    for &t in &order {
        let op = ctx.op(t)?;
        if !op.has_backward() {
            return Err(Error::NoBackwardRule(op.name()));
        }
    }

    if let Some(seed) = ctx.grad_mut(root)?.first_mut() {
        *seed = 1.0;
    }
    for &t in order.iter().rev() {
        propagate(ctx, t)?;
    }
    Ok(())
}

/// Zero the gradient of every tensor reachable from `root`
pub fn zero_grad(ctx: &mut Context, root: Tensor) -> Result<()> {
    for t in build_list(ctx, root)? {
        ctx.clear_grad(t)?;
    }
    Ok(())
}

/// Push the gradient of `t` into its operands
fn propagate(ctx: &mut Context, t: Tensor) -> Result<()> {
    let op = ctx.op(t)?;
    log::trace!("backward {} ({})", t, op.name());
    let g = ctx.grad_array(t)?;

    match op {
        Op::Leaf => {}
        Op::Add { left, right } => {
            ctx.accumulate(left, g.view())?;
            ctx.accumulate(right, g.view())?;
        }
        Op::BroadcastAdd { left, right } => {
            ctx.accumulate(left, g.view())?;
            let target = ctx.shape(right)?;
            let reduced =
                kernels::reduce_broadcast(g.view(), target).ok_or(Error::ShapeMismatch {
                    op: "BroadcastAdd",
                    left: ctx.shape(left)?,
                    right: target,
                })?;
            ctx.accumulate(right, reduced.view())?;
        }
        Op::Sub { left, right } => {
            ctx.accumulate(left, g.view())?;
            ctx.accumulate(right, g.mapv(|v| -v).view())?;
        }
        Op::Mul { left, right } => {
            let d_left = kernels::mul(g.view(), ctx.view(right)?);
            let d_right = kernels::mul(g.view(), ctx.view(left)?);
            ctx.accumulate(left, d_left.view())?;
            ctx.accumulate(right, d_right.view())?;
        }
        Op::MatMul { left, right } => {
            let d_left = g.dot(&ctx.view(right)?.t());
            let d_right = ctx.view(left)?.t().dot(&g);
            ctx.accumulate(left, d_left.view())?;
            ctx.accumulate(right, d_right.view())?;
        }
        Op::Relu { input } => {
            let d = kernels::relu_backward(g.view(), ctx.view(input)?);
            ctx.accumulate(input, d.view())?;
        }
        Op::Sigmoid { input } => {
            let d = kernels::sigmoid_backward(g.view(), ctx.view(t)?);
            ctx.accumulate(input, d.view())?;
        }
        Op::Tanh { input } => {
            let d = kernels::tanh_backward(g.view(), ctx.view(t)?);
            ctx.accumulate(input, d.view())?;
        }
        Op::Square { input } => {
            let d = kernels::square_backward(g.view(), ctx.view(input)?);
            ctx.accumulate(input, d.view())?;
        }
        Op::LogSoftmax { input, axis } => {
            if axis != 1 {
                return Err(Error::NotImplemented {
                    op: "LogSoftmax backward",
                    axis,
                });
            }
            let d = kernels::log_softmax_backward(g.view(), ctx.view(t)?);
            ctx.accumulate(input, d.view())?;
        }
        Op::NllLoss { input, target } => {
            let shape = ctx.shape(input)?;
            let classes = kernels::class_indices(ctx.data(target)?, shape.rows, shape.cols)?;
            let d = kernels::nll_backward(g[[0, 0]], &classes, shape);
            ctx.accumulate(input, d.view())?;
        }
        Op::Copy { .. } | Op::Reshape { .. } | Op::MulByConstant { .. } => {
            return Err(Error::NoBackwardRule(op.name()));
        }
    }
    Ok(())
}
