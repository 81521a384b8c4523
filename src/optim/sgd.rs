//! Stochastic Gradient Descent optimizer

use super::Optimizer;
use crate::autograd::{Context, Tensor};
use crate::Result;

/// SGD with optional momentum, dampening, weight decay and Nesterov momentum
///
/// Per element, with gradient `g` and momentum buffer `b`:
///
/// ```text
/// g = g + weight_decay * θ
/// b = g                                (first step)
/// b = momentum * b + (1 - dampening) * g
/// g = g + momentum * b  (nesterov)  or  g = b
/// θ = θ - lr * g
/// ```
pub struct SGD {
    lr: f32,
    momentum: f32,
    dampening: f32,
    weight_decay: f32,
    nesterov: bool,
    params: Vec<Tensor>,
    buffers: Vec<Option<Vec<f32>>>,
}

impl SGD {
    /// Create a new SGD optimizer with momentum
    pub fn new(lr: f32, momentum: f32) -> Self {
        Self {
            lr,
            momentum,
            dampening: 0.0,
            weight_decay: 0.0,
            nesterov: false,
            params: Vec::new(),
            buffers: Vec::new(),
        }
    }

    pub fn with_dampening(mut self, dampening: f32) -> Self {
        self.dampening = dampening;
        self
    }

    pub fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    pub fn with_nesterov(mut self, nesterov: bool) -> Self {
        self.nesterov = nesterov;
        self
    }
}

impl Optimizer for SGD {
    fn add_param(&mut self, param: Tensor) {
        self.params.push(param);
        self.buffers.push(None);
    }

    fn params(&self) -> &[Tensor] {
        &self.params
    }

    fn step(&mut self, ctx: &mut Context) -> Result<()> {
        for (&param, buffer) in self.params.iter().zip(self.buffers.iter_mut()) {
            let (data, grad) = ctx.data_and_grad_mut(param)?;

            let mut direction: Vec<f32> = grad
                .iter()
                .zip(data.iter())
                .map(|(g, x)| g + self.weight_decay * x)
                .collect();

            if self.momentum != 0.0 {
                let first_step = buffer.is_none();
                let b = buffer.get_or_insert_with(|| direction.clone());
                if !first_step {
                    for (b, g) in b.iter_mut().zip(&direction) {
                        *b = self.momentum * *b + (1.0 - self.dampening) * g;
                    }
                }

                if self.nesterov {
                    for (g, b) in direction.iter_mut().zip(b.iter()) {
                        *g += self.momentum * b;
                    }
                } else {
                    direction.copy_from_slice(b.as_slice());
                }
            }

            for (x, g) in data.iter_mut().zip(&direction) {
                *x -= self.lr * g;
            }
        }
        Ok(())
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}
