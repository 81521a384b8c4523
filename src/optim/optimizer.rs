//! Optimizer trait

use crate::autograd::{Context, Tensor};
use crate::Result;

/// Trait for optimization algorithms
///
/// Parameters are registered once with [`Optimizer::add_param`]; each step
/// reads their gradient buffers and updates their data in place.
pub trait Optimizer {
    /// Register a parameter tensor
    fn add_param(&mut self, param: Tensor);

    /// Registered parameters, in registration order
    fn params(&self) -> &[Tensor];

    /// Perform a single optimization step
    fn step(&mut self, ctx: &mut Context) -> Result<()>;

    /// Zero out the gradients of every registered parameter
    fn zero_grad(&mut self, ctx: &mut Context) -> Result<()> {
        for &param in self.params() {
            ctx.clear_grad(param)?;
        }
        Ok(())
    }

    /// Get learning rate
    fn lr(&self) -> f32;

    /// Set learning rate
    fn set_lr(&mut self, lr: f32);
}
