//! Named parameter sets and their serializable state

use crate::autograd::{ArenaId, Context, Shape, Tensor};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Model metadata stored alongside the parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name/identifier
    pub name: String,

    /// Model architecture (e.g. "mlp-2-2-1")
    pub architecture: String,

    /// Model version
    pub version: String,
}

impl ModelMetadata {
    /// Create new metadata with minimal fields
    pub fn new(name: impl Into<String>, architecture: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            architecture: architecture.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Information about a model parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterInfo {
    /// Parameter name (e.g. "w1", "b2")
    pub name: String,

    /// Parameter shape
    pub shape: Shape,

    /// Whether this parameter requires gradients
    pub requires_grad: bool,
}

/// Serializable model state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelState {
    /// Model metadata
    pub metadata: ModelMetadata,

    /// Parameter information, in storage order
    pub parameters: Vec<ParameterInfo>,

    /// Row-major parameter data, concatenated in storage order
    pub data: Vec<f32>,
}

impl ModelState {
    /// Split `data` into one slice per parameter
    fn chunks(&self) -> Result<Vec<&[f32]>> {
        let expected: usize = self.parameters.iter().map(|p| p.shape.len()).sum();
        if expected != self.data.len() {
            return Err(Error::LengthMismatch {
                expected,
                got: self.data.len(),
            });
        }

        let mut rest = self.data.as_slice();
        let mut chunks = Vec::with_capacity(self.parameters.len());
        for info in &self.parameters {
            let (head, tail) = rest.split_at(info.shape.len());
            chunks.push(head);
            rest = tail;
        }
        Ok(chunks)
    }
}

/// Named parameter tensors living in a [`Context`]
#[derive(Debug, Clone)]
pub struct Model {
    /// Model metadata
    pub metadata: ModelMetadata,

    /// Model parameters
    pub parameters: Vec<(String, Tensor)>,
}

impl Model {
    /// Create a new model
    pub fn new(metadata: ModelMetadata, parameters: Vec<(String, Tensor)>) -> Self {
        Self {
            metadata,
            parameters,
        }
    }

    /// Get parameter by name
    pub fn get_parameter(&self, name: &str) -> Option<Tensor> {
        self.parameters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
    }

    /// Snapshot the parameters into a serializable state
    pub fn to_state(&self, ctx: &Context) -> Result<ModelState> {
        let mut data = Vec::new();
        let mut parameters = Vec::with_capacity(self.parameters.len());

        for (name, tensor) in &self.parameters {
            data.extend_from_slice(ctx.data(*tensor)?);
            parameters.push(ParameterInfo {
                name: name.clone(),
                shape: ctx.shape(*tensor)?,
                requires_grad: ctx.requires_grad(*tensor)?,
            });
        }

        Ok(ModelState {
            metadata: self.metadata.clone(),
            parameters,
            data,
        })
    }

    /// Allocate fresh leaf tensors in `arena` holding the state's parameters
    pub fn from_state(ctx: &mut Context, arena: ArenaId, state: ModelState) -> Result<Self> {
        let chunks = state.chunks()?;
        let mut parameters = Vec::with_capacity(chunks.len());

        for (info, values) in state.parameters.iter().zip(chunks) {
            let tensor = ctx.create_tensor(arena, info.shape, info.requires_grad)?;
            ctx.set_data(tensor, values)?;
            parameters.push((info.name.clone(), tensor));
        }

        Ok(Self {
            metadata: state.metadata,
            parameters,
        })
    }

    /// Overwrite existing parameter data from `state`
    ///
    /// Every parameter of this model must appear in the state under the same
    /// name with the same shape.
    pub fn restore(&self, ctx: &mut Context, state: &ModelState) -> Result<()> {
        let chunks = state.chunks()?;

        for (name, tensor) in &self.parameters {
            let (info, values) = state
                .parameters
                .iter()
                .zip(&chunks)
                .find(|(info, _)| &info.name == name)
                .ok_or_else(|| {
                    Error::Serialization(format!("parameter '{}' missing from checkpoint", name))
                })?;

            let shape = ctx.shape(*tensor)?;
            if shape != info.shape {
                return Err(Error::ShapeMismatch {
                    op: "restore",
                    left: shape,
                    right: info.shape,
                });
            }
            ctx.set_data(*tensor, values)?;
        }
        Ok(())
    }
}
