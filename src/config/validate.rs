//! Configuration validation

use super::schema::TrainSpec;
use crate::train::Activation;

const XOR_ROWS: usize = 4;

/// Validation error type
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("Invalid learning rate: {0} (must be > 0.0)")]
    InvalidLearningRate(f32),

    #[error("Invalid epochs: {0} (must be > 0)")]
    InvalidEpochs(usize),

    #[error("Invalid batch size: {0} (must be in 1..=4, the XOR row count)")]
    InvalidBatchSize(usize),

    #[error("Invalid {field}: {value} (must be > 0)")]
    InvalidWidth { field: &'static str, value: usize },

    #[error("Invalid {field}: {value} bytes (must be > 0)")]
    InvalidArenaSize { field: &'static str, value: usize },

    #[error("Invalid optimizer: {0} (must be one of: adam, sgd)")]
    InvalidOptimizer(String),

    #[error("Invalid activation: {0} (must be one of: relu, sigmoid, tanh)")]
    InvalidActivation(String),

    #[error("Invalid loss: {0} (must be one of: mse, nll)")]
    InvalidLoss(String),

    #[error("Invalid init: {0} (must be one of: uniform, xor)")]
    InvalidInit(String),

    #[error("Loss {loss} cannot train {outputs} output(s) on XOR")]
    LossOutputMismatch { loss: String, outputs: usize },

    #[error("XOR has 2 input features, model expects {0}")]
    InputMismatch(usize),

    #[error("xor init needs a 2-2-1 model, got {inputs}-{hidden}-{outputs}")]
    XorInitShape {
        inputs: usize,
        hidden: usize,
        outputs: usize,
    },
}

/// Validate a training specification
///
/// Checks:
/// - Numeric values are in valid ranges
/// - Names match allowed values
/// - The model fits the XOR task and the chosen loss
pub fn validate_config(spec: &TrainSpec) -> Result<(), ValidationError> {
    let model = &spec.model;

    for (field, value) in [
        ("inputs", model.inputs),
        ("hidden", model.hidden),
        ("outputs", model.outputs),
    ] {
        if value == 0 {
            return Err(ValidationError::InvalidWidth { field, value });
        }
    }
    if model.inputs != 2 {
        return Err(ValidationError::InputMismatch(model.inputs));
    }

    if model.activation.parse::<Activation>().is_err() {
        return Err(ValidationError::InvalidActivation(model.activation.clone()));
    }

    match model.init.as_str() {
        "uniform" => {}
        "xor" => {
            if (model.inputs, model.hidden, model.outputs) != (2, 2, 1) {
                return Err(ValidationError::XorInitShape {
                    inputs: model.inputs,
                    hidden: model.hidden,
                    outputs: model.outputs,
                });
            }
        }
        other => return Err(ValidationError::InvalidInit(other.to_string())),
    }

    let lr = spec.optimizer.lr;
    if lr.is_nan() || lr <= 0.0 {
        return Err(ValidationError::InvalidLearningRate(spec.optimizer.lr));
    }

    let valid_optimizers = ["adam", "sgd"];
    if !valid_optimizers.contains(&spec.optimizer.name.to_lowercase().as_str()) {
        return Err(ValidationError::InvalidOptimizer(
            spec.optimizer.name.clone(),
        ));
    }

    if spec.training.epochs == 0 {
        return Err(ValidationError::InvalidEpochs(spec.training.epochs));
    }

    if let Some(batch_size) = spec.training.batch_size {
        if batch_size == 0 || batch_size > XOR_ROWS {
            return Err(ValidationError::InvalidBatchSize(batch_size));
        }
    }

    let outputs_fit = match spec.training.loss.as_str() {
        "mse" => model.outputs == 1,
        "nll" => model.outputs >= 2,
        other => return Err(ValidationError::InvalidLoss(other.to_string())),
    };
    if !outputs_fit {
        return Err(ValidationError::LossOutputMismatch {
            loss: spec.training.loss.clone(),
            outputs: model.outputs,
        });
    }

    for (field, value) in [
        ("parameter_arena_bytes", spec.memory.parameter_arena_bytes),
        ("step_arena_bytes", spec.memory.step_arena_bytes),
    ] {
        if value == 0 {
            return Err(ValidationError::InvalidArenaSize { field, value });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::*;
    use std::collections::HashMap;

    fn create_valid_spec() -> TrainSpec {
        TrainSpec {
            model: ModelSpec {
                inputs: 2,
                hidden: 2,
                outputs: 1,
                activation: "sigmoid".to_string(),
                init: "xor".to_string(),
            },
            optimizer: OptimSpec {
                name: "adam".to_string(),
                lr: 0.03,
                params: HashMap::new(),
            },
            training: TrainingParams::default(),
            memory: MemorySpec::default(),
            output: None,
        }
    }

    #[test]
    fn test_valid_config() {
        assert_eq!(validate_config(&create_valid_spec()), Ok(()));
    }

    #[test]
    fn test_invalid_learning_rate() {
        let mut spec = create_valid_spec();
        spec.optimizer.lr = 0.0;
        assert_eq!(
            validate_config(&spec),
            Err(ValidationError::InvalidLearningRate(0.0))
        );

        spec.optimizer.lr = f32::NAN;
        assert!(matches!(
            validate_config(&spec),
            Err(ValidationError::InvalidLearningRate(_))
        ));
    }

    #[test]
    fn test_invalid_optimizer() {
        let mut spec = create_valid_spec();
        spec.optimizer.name = "rmsprop".to_string();
        assert_eq!(
            validate_config(&spec),
            Err(ValidationError::InvalidOptimizer("rmsprop".to_string()))
        );
    }

    #[test]
    fn test_invalid_epochs() {
        let mut spec = create_valid_spec();
        spec.training.epochs = 0;
        assert_eq!(
            validate_config(&spec),
            Err(ValidationError::InvalidEpochs(0))
        );
    }

    #[test]
    fn test_invalid_batch_size() {
        let mut spec = create_valid_spec();
        spec.training.batch_size = Some(2);
        assert_eq!(validate_config(&spec), Ok(()));

        for bad in [0, 5] {
            spec.training.batch_size = Some(bad);
            assert_eq!(
                validate_config(&spec),
                Err(ValidationError::InvalidBatchSize(bad))
            );
        }
    }

    #[test]
    fn test_zero_hidden_width() {
        let mut spec = create_valid_spec();
        spec.model.init = "uniform".to_string();
        spec.model.hidden = 0;
        assert_eq!(
            validate_config(&spec),
            Err(ValidationError::InvalidWidth {
                field: "hidden",
                value: 0
            })
        );
    }

    #[test]
    fn test_inputs_must_match_xor() {
        let mut spec = create_valid_spec();
        spec.model.init = "uniform".to_string();
        spec.model.inputs = 3;
        assert_eq!(
            validate_config(&spec),
            Err(ValidationError::InputMismatch(3))
        );
    }

    #[test]
    fn test_unknown_activation_and_init() {
        let mut spec = create_valid_spec();
        spec.model.activation = "gelu".to_string();
        assert!(matches!(
            validate_config(&spec),
            Err(ValidationError::InvalidActivation(_))
        ));

        let mut spec = create_valid_spec();
        spec.model.init = "zeros".to_string();
        assert!(matches!(
            validate_config(&spec),
            Err(ValidationError::InvalidInit(_))
        ));
    }

    #[test]
    fn test_xor_init_requires_2_2_1() {
        let mut spec = create_valid_spec();
        spec.model.hidden = 4;
        assert!(matches!(
            validate_config(&spec),
            Err(ValidationError::XorInitShape { hidden: 4, .. })
        ));
    }

    #[test]
    fn test_loss_output_compatibility() {
        let mut spec = create_valid_spec();
        spec.training.loss = "nll".to_string();
        assert!(matches!(
            validate_config(&spec),
            Err(ValidationError::LossOutputMismatch { outputs: 1, .. })
        ));

        spec.model.init = "uniform".to_string();
        spec.model.outputs = 2;
        assert_eq!(validate_config(&spec), Ok(()));

        spec.training.loss = "mse".to_string();
        assert!(matches!(
            validate_config(&spec),
            Err(ValidationError::LossOutputMismatch { outputs: 2, .. })
        ));

        spec.training.loss = "hinge".to_string();
        assert!(matches!(
            validate_config(&spec),
            Err(ValidationError::InvalidLoss(_))
        ));
    }

    #[test]
    fn test_zero_arena_size() {
        let mut spec = create_valid_spec();
        spec.memory.step_arena_bytes = 0;
        assert_eq!(
            validate_config(&spec),
            Err(ValidationError::InvalidArenaSize {
                field: "step_arena_bytes",
                value: 0
            })
        );
    }
}
