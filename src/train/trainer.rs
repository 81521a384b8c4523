//! Trainer running the two-arena training loop

use super::{DataLoader, LossFn, Mlp, TrainConfig};
use crate::autograd::{backward, ops, ArenaId, Context, Tensor, EPS_FOR_EQUAL};
use crate::optim::Optimizer;
use crate::{Error, Result};
use ndarray::Array2;

/// Result of a training run
#[derive(Debug, Clone)]
pub struct TrainResult {
    /// Loss of the first step
    pub initial_loss: f32,
    /// Loss of the last step
    pub final_loss: f32,
    /// Number of epochs run
    pub epochs: usize,
    /// Loss of every step, in order
    pub losses: Vec<f32>,
}

/// Owns the context, the model and the optimizer
///
/// Parameters and datasets live in the parameter arena. Every step, and
/// every evaluation, brackets its graph with a checkpoint of the step arena
/// and rolls it back afterwards, so the step arena never grows across
/// iterations.
pub struct Trainer {
    ctx: Context,
    params_arena: ArenaId,
    step_arena: ArenaId,
    model: Mlp,
    optimizer: Box<dyn Optimizer>,
    loss_fn: Box<dyn LossFn>,
    config: TrainConfig,
}

impl Trainer {
    /// Create a trainer and register the model's parameters with the optimizer
    pub fn new(
        ctx: Context,
        params_arena: ArenaId,
        step_arena: ArenaId,
        model: Mlp,
        mut optimizer: Box<dyn Optimizer>,
        loss_fn: Box<dyn LossFn>,
        config: TrainConfig,
    ) -> Self {
        for param in model.parameters() {
            optimizer.add_param(param);
        }
        Self {
            ctx,
            params_arena,
            step_arena,
            model,
            optimizer,
            loss_fn,
            config,
        }
    }

    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    pub fn model(&self) -> &Mlp {
        &self.model
    }

    pub fn params_arena(&self) -> ArenaId {
        self.params_arena
    }

    pub fn step_arena(&self) -> ArenaId {
        self.step_arena
    }

    /// Get current learning rate
    pub fn lr(&self) -> f32 {
        self.optimizer.lr()
    }

    /// Set learning rate
    pub fn set_lr(&mut self, lr: f32) {
        self.optimizer.set_lr(lr);
    }

    /// Run `f` against the step arena, rolling back whatever it allocated
    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.ctx.checkpoint(self.step_arena)?;
        let result = f(self);
        let rolled_back = self.ctx.rollback(self.step_arena);
        let value = result?;
        rolled_back?;
        Ok(value)
    }

    /// Forward, loss, backward and update on tensors already in place
    fn step(&mut self, inputs: Tensor, targets: Tensor) -> Result<f32> {
        let arena = self.step_arena;
        self.optimizer.zero_grad(&mut self.ctx)?;

        let predictions = self.model.forward(&mut self.ctx, arena, inputs)?;
        let loss = self
            .loss_fn
            .forward(&mut self.ctx, arena, predictions, targets)?;
        let value = self.ctx.item(loss)?;

        backward(&mut self.ctx, loss)?;
        self.optimizer.step(&mut self.ctx)?;
        Ok(value)
    }

    /// One optimization step on `(inputs, targets)`; returns the loss before the update
    pub fn train_step(&mut self, inputs: Tensor, targets: Tensor) -> Result<f32> {
        self.scoped(|trainer| trainer.step(inputs, targets))
    }

    /// One pass over `loader`, one step per batch; returns the mean batch loss
    ///
    /// Each batch is gathered into the step arena inside that step's
    /// checkpoint.
    pub fn train_epoch(&mut self, loader: &mut DataLoader) -> Result<f32> {
        loader.reset();
        let mut total = 0.0;
        let mut batches = 0;
        loop {
            let loss = self.scoped(|trainer| {
                let arena = trainer.step_arena;
                match loader.next_batch(&mut trainer.ctx, arena)? {
                    Some((inputs, targets)) => trainer.step(inputs, targets).map(Some),
                    None => Ok(None),
                }
            })?;
            match loss {
                Some(loss) => {
                    total += loss;
                    batches += 1;
                }
                None => break,
            }
        }
        if batches == 0 {
            return Err(Error::InvalidParameter("loader yielded no batches".to_string()));
        }
        Ok(total / batches as f32)
    }

    /// Full-batch training for `epochs` steps
    pub fn train(&mut self, inputs: Tensor, targets: Tensor, epochs: usize) -> Result<TrainResult> {
        self.run_epochs(epochs, |trainer| trainer.train_step(inputs, targets))
    }

    /// Mini-batch training for `epochs` passes over `loader`
    ///
    /// `losses` holds the mean batch loss of each epoch.
    pub fn train_batched(&mut self, loader: &mut DataLoader, epochs: usize) -> Result<TrainResult> {
        self.run_epochs(epochs, |trainer| trainer.train_epoch(loader))
    }

    fn run_epochs(
        &mut self,
        epochs: usize,
        mut epoch_fn: impl FnMut(&mut Self) -> Result<f32>,
    ) -> Result<TrainResult> {
        if epochs == 0 {
            return Err(Error::InvalidParameter(
                "epochs must be greater than 0".to_string(),
            ));
        }

        let mut losses = Vec::with_capacity(epochs);
        for epoch in 0..epochs {
            let loss = epoch_fn(self)?;
            losses.push(loss);
            if self.config.should_log(epoch) {
                log::info!(
                    "epoch {}/{}: {} loss={:.6}",
                    epoch + 1,
                    epochs,
                    self.loss_fn.name(),
                    loss
                );
            }
        }

        Ok(TrainResult {
            initial_loss: losses[0],
            final_loss: losses[losses.len() - 1],
            epochs,
            losses,
        })
    }

    /// Model outputs for `inputs`
    pub fn predict(&mut self, inputs: Tensor) -> Result<Array2<f32>> {
        self.scoped(|trainer| {
            let out = trainer
                .model
                .forward(&mut trainer.ctx, trainer.step_arena, inputs)?;
            trainer.ctx.to_array(out)
        })
    }

    /// Fraction of rows predicted correctly
    ///
    /// With several outputs the prediction is the per-row argmax compared to
    /// the class index in `targets`. With a single output the prediction is
    /// correct when it lies within 0.5 of the target.
    pub fn accuracy(&mut self, inputs: Tensor, targets: Tensor) -> Result<f32> {
        self.scoped(|trainer| {
            let arena = trainer.step_arena;
            let ctx = &mut trainer.ctx;
            let out = trainer.model.forward(ctx, arena, inputs)?;
            let rows = ctx.shape(out)?.rows;

            let hits = if trainer.model.outputs(ctx)? > 1 {
                let classes = ops::argmax(ctx, arena, out, 1)?;
                ops::equal(ctx, arena, classes, targets, EPS_FOR_EQUAL)?
            } else {
                ops::equal(ctx, arena, out, targets, 0.5)?
            };
            let correct = ops::sum_all(ctx, arena, hits)?;
            Ok(ctx.item(correct)? / rows as f32)
        })
    }
}
