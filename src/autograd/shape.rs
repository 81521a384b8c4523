//! Fixed rank-2 shapes

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rows x columns of a tensor
///
/// Scalars are `(1, 1)` and vectors are `(1, n)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    /// Shape of a scalar tensor
    pub const SCALAR: Shape = Shape { rows: 1, cols: 1 };

    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Number of elements (`rows * cols`)
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of one buffer of this shape in bytes
    pub fn byte_size(&self) -> usize {
        self.len() * std::mem::size_of::<f32>()
    }

    pub fn is_scalar(&self) -> bool {
        *self == Self::SCALAR
    }

    /// Check whether `right` can be broadcast onto `self`.
    ///
    /// Holds when every dimension of `right` equals the matching dimension
    /// of `self` or is 1.
    pub fn broadcastable(&self, right: &Shape) -> bool {
        (right.rows == self.rows || right.rows == 1) && (right.cols == self.cols || right.cols == 1)
    }

    /// Reject shapes with a zero dimension
    pub fn validate(self) -> Result<Self> {
        if self.rows == 0 || self.cols == 0 {
            return Err(Error::InvalidShape(self));
        }
        Ok(self)
    }

    /// Shape with rows and columns swapped
    pub fn transposed(&self) -> Self {
        Self::new(self.cols, self.rows)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.rows, self.cols)
    }
}

impl From<(usize, usize)> for Shape {
    fn from((rows, cols): (usize, usize)) -> Self {
        Self::new(rows, cols)
    }
}

/// Exact shape equality
pub fn shapes_equal(a: Shape, b: Shape) -> bool {
    a == b
}

/// Restricted 2-D broadcast check, see [`Shape::broadcastable`]
pub fn broadcastable(left: Shape, right: Shape) -> bool {
    left.broadcastable(&right)
}
