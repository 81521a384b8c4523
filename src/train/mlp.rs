//! Two-layer perceptron

use crate::autograd::{ops, ArenaId, Context, Shape, Tensor};
use crate::io::{Model, ModelMetadata};
use crate::{Error, Result};
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// Hidden-layer nonlinearity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    pub fn apply(self, ctx: &mut Context, arena: ArenaId, x: Tensor) -> Result<Tensor> {
        match self {
            Activation::Relu => ops::relu(ctx, arena, x),
            Activation::Sigmoid => ops::sigmoid(ctx, arena, x),
            Activation::Tanh => ops::tanh(ctx, arena, x),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Activation::Relu => "relu",
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relu" => Ok(Activation::Relu),
            "sigmoid" => Ok(Activation::Sigmoid),
            "tanh" => Ok(Activation::Tanh),
            _ => Err(format!(
                "Unknown activation: {}. Valid: relu, sigmoid, tanh",
                s
            )),
        }
    }
}

/// `act(x @ W1 + B1) @ W2 + B2`
///
/// The four parameters are trainable leaves allocated once from a
/// persistent arena; every forward pass allocates only from the arena it is
/// given.
#[derive(Debug, Clone, Copy)]
pub struct Mlp {
    pub w1: Tensor,
    pub b1: Tensor,
    pub w2: Tensor,
    pub b2: Tensor,
    activation: Activation,
}

impl Mlp {
    /// Uniform `[-1, 1]` initialization
    pub fn new<R: Rng + ?Sized>(
        ctx: &mut Context,
        arena: ArenaId,
        inputs: usize,
        hidden: usize,
        outputs: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Result<Self> {
        let w1 = ops::uniform(ctx, arena, Shape::new(inputs, hidden).validate()?, -1.0, 1.0, rng)?;
        let b1 = ops::uniform(ctx, arena, Shape::new(1, hidden), -1.0, 1.0, rng)?;
        let w2 = ops::uniform(ctx, arena, Shape::new(hidden, outputs).validate()?, -1.0, 1.0, rng)?;
        let b2 = ops::uniform(ctx, arena, Shape::new(1, outputs), -1.0, 1.0, rng)?;
        Ok(Self {
            w1,
            b1,
            w2,
            b2,
            activation,
        })
    }

    /// The fixed 2-2-1 starting point used for XOR
    pub fn xor(ctx: &mut Context, arena: ArenaId, activation: Activation) -> Result<Self> {
        let w1 = ops::from_slice(ctx, arena, Shape::new(2, 2), &[0.15, -0.61, -0.26, 0.35], true)?;
        let b1 = ops::from_slice(ctx, arena, Shape::new(1, 2), &[-0.25, 0.68], true)?;
        let w2 = ops::from_slice(ctx, arena, Shape::new(2, 1), &[-0.45, 0.96], true)?;
        let b2 = ops::from_slice(ctx, arena, Shape::SCALAR, &[0.78], true)?;
        Ok(Self {
            w1,
            b1,
            w2,
            b2,
            activation,
        })
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Forward pass; every intermediate is allocated from `arena`
    pub fn forward(&self, ctx: &mut Context, arena: ArenaId, x: Tensor) -> Result<Tensor> {
        let l1 = ops::matmul(ctx, arena, x, self.w1)?;
        let l1 = ops::add(ctx, arena, l1, self.b1)?;
        let h = self.activation.apply(ctx, arena, l1)?;
        let l2 = ops::matmul(ctx, arena, h, self.w2)?;
        ops::add(ctx, arena, l2, self.b2)
    }

    /// Parameters in registration order
    pub fn parameters(&self) -> [Tensor; 4] {
        [self.w1, self.b1, self.w2, self.b2]
    }

    pub fn named_parameters(&self) -> Vec<(String, Tensor)> {
        ["w1", "b1", "w2", "b2"]
            .iter()
            .zip(self.parameters())
            .map(|(name, t)| (name.to_string(), t))
            .collect()
    }

    /// Width of the output layer
    pub fn outputs(&self, ctx: &Context) -> Result<usize> {
        Ok(ctx.shape(self.w2)?.cols)
    }

    /// Wrap the parameters for checkpointing
    pub fn to_model(&self, ctx: &Context, name: &str) -> Result<Model> {
        let (w1, w2) = (ctx.shape(self.w1)?, ctx.shape(self.w2)?);
        let architecture = format!(
            "mlp-{}-{}-{}-{}",
            w1.rows, w1.cols, w2.cols, self.activation
        );
        Ok(Model::new(
            ModelMetadata::new(name, architecture),
            self.named_parameters(),
        ))
    }

    /// Rebuild from a checkpointed model with parameters named w1, b1, w2, b2
    pub fn from_model(model: &Model, activation: Activation) -> Result<Self> {
        let get = |name: &str| {
            model.get_parameter(name).ok_or_else(|| {
                Error::Serialization(format!("parameter '{}' missing from model", name))
            })
        };
        Ok(Self {
            w1: get("w1")?,
            b1: get("b1")?,
            w2: get("w2")?,
            b2: get("b2")?,
            activation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_activation_from_str() {
        assert_eq!("relu".parse::<Activation>(), Ok(Activation::Relu));
        assert_eq!("Sigmoid".parse::<Activation>(), Ok(Activation::Sigmoid));
        assert_eq!("TANH".parse::<Activation>(), Ok(Activation::Tanh));
        assert!("gelu".parse::<Activation>().is_err());
    }

    #[test]
    fn test_uniform_init_shapes_and_range() {
        let mut ctx = Context::new();
        let arena = ctx.create_arena(1 << 16).unwrap();
        let mut rng = StdRng::seed_from_u64(41423);
        let mlp = Mlp::new(&mut ctx, arena, 3, 5, 2, Activation::Tanh, &mut rng).unwrap();

        assert_eq!(ctx.shape(mlp.w1).unwrap(), Shape::new(3, 5));
        assert_eq!(ctx.shape(mlp.b1).unwrap(), Shape::new(1, 5));
        assert_eq!(ctx.shape(mlp.w2).unwrap(), Shape::new(5, 2));
        assert_eq!(ctx.shape(mlp.b2).unwrap(), Shape::new(1, 2));
        for t in mlp.parameters() {
            assert!(ctx.requires_grad(t).unwrap());
            assert!(ctx.data(t).unwrap().iter().all(|v| (-1.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn test_zero_width_is_rejected() {
        let mut ctx = Context::new();
        let arena = ctx.create_arena(1 << 16).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            Mlp::new(&mut ctx, arena, 2, 0, 1, Activation::Relu, &mut rng),
            Err(Error::InvalidShape(_))
        ));
    }

    #[test]
    fn test_forward_shape_and_known_value() {
        let mut ctx = Context::new();
        let params = ctx.create_arena(1 << 16).unwrap();
        let scratch = ctx.create_arena(1 << 16).unwrap();
        let mlp = Mlp::xor(&mut ctx, params, Activation::Relu).unwrap();
        let x = ops::from_slice(&mut ctx, params, Shape::new(1, 2), &[0.0, 0.0], false).unwrap();

        let y = mlp.forward(&mut ctx, scratch, x).unwrap();
        assert_eq!(ctx.shape(y).unwrap(), Shape::SCALAR);
        // relu([-0.25, 0.68]) @ [-0.45, 0.96] + 0.78
        let expected = 0.68 * 0.96 + 0.78;
        assert!((ctx.item(y).unwrap() - expected).abs() < 1e-5);
        assert_eq!(y.arena(), scratch);
    }

    #[test]
    fn test_model_round_trip() {
        let mut ctx = Context::new();
        let arena = ctx.create_arena(1 << 16).unwrap();
        let mlp = Mlp::xor(&mut ctx, arena, Activation::Sigmoid).unwrap();

        let model = mlp.to_model(&ctx, "xor").unwrap();
        assert_eq!(model.metadata.architecture, "mlp-2-2-1-sigmoid");

        let back = Mlp::from_model(&model, Activation::Sigmoid).unwrap();
        assert_eq!(back.parameters(), mlp.parameters());
    }
}
