//! Arena-backed autograd engine
//!
//! Tensors are handles into a [`Context`], which owns every arena and the
//! table of tensors carved from it. Forward operators in [`ops`] compute
//! eagerly and record how each result was produced; [`backward`] linearizes
//! the recorded graph with [`build_list`] and accumulates vector-Jacobian
//! products from the root back to the leaves.
//!
//! ```
//! use nfnn::autograd::{backward, ops, Context, Shape};
//!
//! let mut ctx = Context::new();
//! let arena = ctx.create_arena(4096).unwrap();
//! let x = ops::from_slice(&mut ctx, arena, Shape::new(1, 2), &[1.0, 2.0], true).unwrap();
//! let y = ops::square(&mut ctx, arena, x).unwrap();
//! let loss = ops::sum_all(&mut ctx, arena, y).unwrap();
//!
//! backward(&mut ctx, loss).unwrap();
//! assert_eq!(ctx.grad(x).unwrap(), &[2.0, 4.0]);
//! ```

mod backward;
mod context;
mod graph;
pub mod kernels;
mod op;
pub mod ops;
mod shape;
mod tensor;


pub use backward::{backward, zero_grad};
pub use context::Context;
pub use graph::build_list;
pub use op::Op;
pub use shape::{broadcastable, shapes_equal, Shape};
pub use tensor::{ArenaId, Buffer, Tensor};

/// Tolerance used when comparing tensors for equality
pub const EPS_FOR_EQUAL: f32 = 1e-4;
