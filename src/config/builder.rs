//! Build training components from configuration

use super::schema::{OptimSpec, TrainSpec};
use crate::autograd::Context;
use crate::error::{Error, Result};
use crate::optim::{Adam, Optimizer, SGD};
use crate::train::{
    xor_dataset, Activation, CrossEntropyLoss, LossFn, MSELoss, Mlp, TrainConfig, Trainer,
};
use crate::Tensor;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Build optimizer from configuration
pub fn build_optimizer(spec: &OptimSpec) -> Result<Box<dyn Optimizer>> {
    match spec.name.to_lowercase().as_str() {
        "sgd" => Ok(Box::new(
            SGD::new(spec.lr, spec.param("momentum", 0.0))
                .with_dampening(spec.param("dampening", 0.0))
                .with_weight_decay(spec.param("weight_decay", 0.0))
                .with_nesterov(spec.flag("nesterov")),
        )),
        // Zero betas fall back to the optimizer defaults
        "adam" => Ok(Box::new(Adam::new(
            spec.lr,
            spec.param("beta1", 0.0),
            spec.param("beta2", 0.0),
        ))),
        name => Err(Error::ConfigError(format!(
            "Unknown optimizer: {}. Supported: sgd, adam",
            name
        ))),
    }
}

/// Build loss function by name
pub fn build_loss(name: &str) -> Result<Box<dyn LossFn>> {
    match name {
        "mse" => Ok(Box::new(MSELoss)),
        "nll" => Ok(Box::new(CrossEntropyLoss)),
        other => Err(Error::ConfigError(format!(
            "Unknown loss: {}. Supported: mse, nll",
            other
        ))),
    }
}

/// Allocate both arenas, the model and the XOR dataset, and wire up a trainer
///
/// Returns the trainer with the dataset's `(inputs, targets)`, which live in
/// the parameter arena.
pub fn build_trainer(spec: &TrainSpec) -> Result<(Trainer, Tensor, Tensor)> {
    let activation: Activation = spec.model.activation.parse().map_err(Error::ConfigError)?;

    let mut ctx = Context::new();
    let params = ctx.create_arena(spec.memory.parameter_arena_bytes)?;
    let scratch = ctx.create_arena(spec.memory.step_arena_bytes)?;

    let model = match spec.model.init.as_str() {
        "xor" => Mlp::xor(&mut ctx, params, activation)?,
        _ => {
            let mut rng = StdRng::seed_from_u64(spec.training.seed);
            Mlp::new(
                &mut ctx,
                params,
                spec.model.inputs,
                spec.model.hidden,
                spec.model.outputs,
                activation,
                &mut rng,
            )?
        }
    };
    let (inputs, targets) = xor_dataset(&mut ctx, params)?;

    let trainer = Trainer::new(
        ctx,
        params,
        scratch,
        model,
        build_optimizer(&spec.optimizer)?,
        build_loss(&spec.training.loss)?,
        TrainConfig::new().with_log_interval(spec.training.log_interval),
    );
    Ok((trainer, inputs, targets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{MemorySpec, ModelSpec, TrainingParams};

    fn optim(name: &str, lr: f32, params: &[(&str, serde_json::Value)]) -> OptimSpec {
        OptimSpec {
            name: name.to_string(),
            lr,
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn test_build_optimizer_adam() {
        let spec = optim(
            "adam",
            0.001,
            &[
                ("beta1", serde_json::json!(0.9)),
                ("beta2", serde_json::json!(0.999)),
            ],
        );
        let optimizer = build_optimizer(&spec).unwrap();
        assert_eq!(optimizer.lr(), 0.001);
    }

    #[test]
    fn test_build_optimizer_sgd() {
        let spec = optim(
            "SGD",
            0.01,
            &[
                ("momentum", serde_json::json!(0.9)),
                ("nesterov", serde_json::json!(true)),
            ],
        );
        let optimizer = build_optimizer(&spec).unwrap();
        assert_eq!(optimizer.lr(), 0.01);
    }

    #[test]
    fn test_build_optimizer_unknown() {
        let result = build_optimizer(&optim("adamw", 0.001, &[]));
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_build_loss() {
        assert_eq!(build_loss("mse").unwrap().name(), "mse");
        assert_eq!(build_loss("nll").unwrap().name(), "nll");
        assert!(build_loss("hinge").is_err());
    }

    #[test]
    fn test_build_trainer_registers_model() {
        let spec = TrainSpec {
            model: ModelSpec {
                inputs: 2,
                hidden: 4,
                outputs: 2,
                activation: "relu".to_string(),
                init: "uniform".to_string(),
            },
            optimizer: optim("adam", 0.03, &[]),
            training: TrainingParams {
                loss: "nll".to_string(),
                ..TrainingParams::default()
            },
            memory: MemorySpec::default(),
            output: None,
        };

        let (trainer, inputs, targets) = build_trainer(&spec).unwrap();
        let ctx = trainer.ctx();
        assert_eq!(inputs.arena(), trainer.params_arena());
        assert_eq!(targets.arena(), trainer.params_arena());
        assert_eq!(ctx.shape(trainer.model().w1).unwrap().cols, 4);
        assert_eq!(trainer.model().activation(), Activation::Relu);
        assert_eq!(ctx.arena(trainer.step_arena()).unwrap().used(), 0);
    }
}
