//! Adam optimizer

use super::Optimizer;
use crate::autograd::{Context, Tensor};
use crate::Result;

const DEFAULT_LR: f32 = 0.001;
const DEFAULT_BETA1: f32 = 0.9;
const DEFAULT_BETA2: f32 = 0.999;
const EPSILON: f32 = 1e-8;

/// Adam optimizer (Adaptive Moment Estimation)
///
/// Uses the biased moment estimates directly, without bias correction:
/// `θ -= lr * m / (sqrt(v) + 1e-8)`.
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    params: Vec<Tensor>,
    m: Vec<Vec<f32>>, // First moment
    v: Vec<Vec<f32>>, // Second moment
}

impl Adam {
    /// Create a new Adam optimizer. A zero argument selects its default
    /// (`lr = 0.001`, `beta1 = 0.9`, `beta2 = 0.999`).
    pub fn new(lr: f32, beta1: f32, beta2: f32) -> Self {
        let or_default = |value: f32, default: f32| if value == 0.0 { default } else { value };
        Self {
            lr: or_default(lr, DEFAULT_LR),
            beta1: or_default(beta1, DEFAULT_BETA1),
            beta2: or_default(beta2, DEFAULT_BETA2),
            params: Vec::new(),
            m: Vec::new(),
            v: Vec::new(),
        }
    }

    /// Create Adam with default betas
    pub fn default_params(lr: f32) -> Self {
        Self::new(lr, DEFAULT_BETA1, DEFAULT_BETA2)
    }

    pub fn beta1(&self) -> f32 {
        self.beta1
    }

    pub fn beta2(&self) -> f32 {
        self.beta2
    }
}

impl Optimizer for Adam {
    fn add_param(&mut self, param: Tensor) {
        self.params.push(param);
        self.m.push(Vec::new());
        self.v.push(Vec::new());
    }

    fn params(&self) -> &[Tensor] {
        &self.params
    }

    fn step(&mut self, ctx: &mut Context) -> Result<()> {
        for ((&param, m), v) in self.params.iter().zip(&mut self.m).zip(&mut self.v) {
            let (theta, grad) = ctx.data_and_grad_mut(param)?;
            if m.len() != grad.len() {
                m.resize(grad.len(), 0.0);
                v.resize(grad.len(), 0.0);
            }

            for (((x, g), m), v) in theta.iter_mut().zip(grad).zip(m.iter_mut()).zip(v.iter_mut()) {
                // m_t = β1 * m_{t-1} + (1 - β1) * g
                *m = self.beta1 * *m + (1.0 - self.beta1) * g;
                // v_t = β2 * v_{t-1} + (1 - β2) * g²
                *v = self.beta2 * *v + (1.0 - self.beta2) * g * g;
                *x -= self.lr * *m / (v.sqrt() + EPSILON);
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
