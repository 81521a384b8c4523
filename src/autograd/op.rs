//! Provenance tags recorded on every tensor

use super::Tensor;

/// How a tensor was produced
///
/// Operands are handles into the owning context, never owned tensors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    /// Parameters, constants and loaded data
    Leaf,
    Add { left: Tensor, right: Tensor },
    BroadcastAdd { left: Tensor, right: Tensor },
    Sub { left: Tensor, right: Tensor },
    /// Elementwise (Hadamard) product
    Mul { left: Tensor, right: Tensor },
    MatMul { left: Tensor, right: Tensor },
    Relu { input: Tensor },
    Sigmoid { input: Tensor },
    Tanh { input: Tensor },
    Square { input: Tensor },
    LogSoftmax { input: Tensor, axis: usize },
    /// `target` holds one float-encoded class index per row of `input`
    NllLoss { input: Tensor, target: Tensor },
    Copy { input: Tensor },
    Reshape { input: Tensor },
    MulByConstant { input: Tensor, factor: f32 },
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Op::Leaf => "Leaf",
            Op::Add { .. } => "Add",
            Op::BroadcastAdd { .. } => "BroadcastAdd",
            Op::Sub { .. } => "Sub",
            Op::Mul { .. } => "Mul",
            Op::MatMul { .. } => "MatMul",
            Op::Relu { .. } => "ReLU",
            Op::Sigmoid { .. } => "Sigmoid",
            Op::Tanh { .. } => "Tanh",
            Op::Square { .. } => "Square",
            Op::LogSoftmax { .. } => "LogSoftmax",
            Op::NllLoss { .. } => "NLLLoss",
            Op::Copy { .. } => "Copy",
            Op::Reshape { .. } => "Reshape",
            Op::MulByConstant { .. } => "MulByConstant",
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Op::Leaf)
    }

    /// Operand handles in visiting order (left before right)
    pub fn operands(&self) -> impl Iterator<Item = Tensor> {
        let pair = match *self {
            Op::Leaf => [None, None],
            Op::Add { left, right }
            | Op::BroadcastAdd { left, right }
            | Op::Sub { left, right }
            | Op::Mul { left, right }
            | Op::MatMul { left, right } => [Some(left), Some(right)],
            Op::NllLoss { input, target } => [Some(input), Some(target)],
            Op::Relu { input }
            | Op::Sigmoid { input }
            | Op::Tanh { input }
            | Op::Square { input }
            | Op::LogSoftmax { input, .. }
            | Op::Copy { input }
            | Op::Reshape { input }
            | Op::MulByConstant { input, .. } => [Some(input), None],
        };
        pair.into_iter().flatten()
    }

    /// Whether the backward engine has a rule for this operator
    pub fn has_backward(&self) -> bool {
        !matches!(
            self,
            Op::Copy { .. } | Op::Reshape { .. } | Op::MulByConstant { .. }
        )
    }
}
