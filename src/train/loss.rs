//! Loss functions for training

use crate::autograd::{ops, ArenaId, Context, Tensor};
use crate::Result;

/// Trait for loss functions
pub trait LossFn {
    /// Record the loss of `predictions` against `targets` as a `(1, 1)` tensor
    fn forward(
        &self,
        ctx: &mut Context,
        arena: ArenaId,
        predictions: Tensor,
        targets: Tensor,
    ) -> Result<Tensor>;

    /// Name of the loss function
    fn name(&self) -> &str;
}

/// Half mean squared error over rows, see [`ops::mse_loss`]
///
/// Targets must have the same shape as the predictions.
pub struct MSELoss;

impl LossFn for MSELoss {
    fn forward(
        &self,
        ctx: &mut Context,
        arena: ArenaId,
        predictions: Tensor,
        targets: Tensor,
    ) -> Result<Tensor> {
        ops::mse_loss(ctx, arena, predictions, targets)
    }

    fn name(&self) -> &str {
        "mse"
    }
}

/// Log-softmax over each row followed by negative log-likelihood
///
/// Predictions are raw logits; targets hold one class index per row.
pub struct CrossEntropyLoss;

impl LossFn for CrossEntropyLoss {
    fn forward(
        &self,
        ctx: &mut Context,
        arena: ArenaId,
        predictions: Tensor,
        targets: Tensor,
    ) -> Result<Tensor> {
        let log_probs = ops::log_softmax(ctx, arena, predictions, 1)?;
        ops::nll_loss(ctx, arena, log_probs, targets)
    }

    fn name(&self) -> &str {
        "nll"
    }
}
