//! Numeric kernels over `ndarray` views
//!
//! Kernels are pure: they read views and return owned arrays. The operator
//! layer copies results into arena buffers.

use super::Shape;
use crate::{Error, Result};
use ndarray::{Array2, ArrayView2, Axis, Zip};

pub fn add(a: ArrayView2<'_, f32>, b: ArrayView2<'_, f32>) -> Array2<f32> {
    &a + &b
}

pub fn sub(a: ArrayView2<'_, f32>, b: ArrayView2<'_, f32>) -> Array2<f32> {
    &a - &b
}

pub fn mul(a: ArrayView2<'_, f32>, b: ArrayView2<'_, f32>) -> Array2<f32> {
    &a * &b
}

pub fn matmul(a: ArrayView2<'_, f32>, b: ArrayView2<'_, f32>) -> Array2<f32> {
    a.dot(&b)
}

pub fn relu(x: ArrayView2<'_, f32>) -> Array2<f32> {
    x.mapv(|v| v.max(0.0))
}

pub fn sigmoid(x: ArrayView2<'_, f32>) -> Array2<f32> {
    x.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}

pub fn tanh(x: ArrayView2<'_, f32>) -> Array2<f32> {
    x.mapv(f32::tanh)
}

pub fn square(x: ArrayView2<'_, f32>) -> Array2<f32> {
    x.mapv(|v| v * v)
}

pub fn scale(x: ArrayView2<'_, f32>, factor: f32) -> Array2<f32> {
    x.mapv(|v| v * factor)
}

/// Row-wise `x - max - ln(sum(exp(x - max)))`
pub fn log_softmax_rows(x: ArrayView2<'_, f32>) -> Array2<f32> {
    let mut out = x.to_owned();
    for mut row in out.rows_mut() {
        let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        let log_sum = row.iter().map(|&v| (v - max).exp()).sum::<f32>().ln();
        row.mapv_inplace(|v| v - max - log_sum);
    }
    out
}

/// Index of the first maximum of each row, as a `(rows, 1)` column
pub fn argmax_rows(x: ArrayView2<'_, f32>) -> Array2<f32> {
    let mut out = Array2::zeros((x.nrows(), 1));
    for (r, row) in x.rows().into_iter().enumerate() {
        let mut best = 0;
        for (c, &v) in row.iter().enumerate() {
            if v > row[best] {
                best = c;
            }
        }
        out[[r, 0]] = best as f32;
    }
    out
}

/// `1.0` where `|a - b| < eps`, else `0.0`
pub fn equal(a: ArrayView2<'_, f32>, b: ArrayView2<'_, f32>, eps: f32) -> Array2<f32> {
    Zip::from(&a)
        .and(&b)
        .map_collect(|&x, &y| if (x - y).abs() < eps { 1.0 } else { 0.0 })
}

/// Decode float-encoded class labels, one per row
pub fn class_indices(targets: &[f32], rows: usize, classes: usize) -> Result<Vec<usize>> {
    if targets.len() != rows {
        return Err(Error::LengthMismatch {
            expected: rows,
            got: targets.len(),
        });
    }
    targets
        .iter()
        .enumerate()
        .map(|(row, &target)| {
            let valid = target >= 0.0 && target.fract() == 0.0 && (target as usize) < classes;
            if valid {
                Ok(target as usize)
            } else {
                Err(Error::InvalidTarget {
                    row,
                    target,
                    classes,
                })
            }
        })
        .collect()
}

/// `-mean_r(logp[r, class[r]])`
pub fn nll_loss(logp: ArrayView2<'_, f32>, classes: &[usize]) -> f32 {
    let picked: f32 = classes
        .iter()
        .enumerate()
        .map(|(r, &c)| logp[[r, c]])
        .sum();
    -picked / logp.nrows() as f32
}

/// Reduce `g` back onto the shape a right-hand operand was broadcast from
pub fn reduce_broadcast(g: ArrayView2<'_, f32>, target: Shape) -> Option<Array2<f32>> {
    if target.is_scalar() {
        Some(Array2::from_elem((1, 1), g.sum()))
    } else if target.rows == 1 && target.cols == g.ncols() {
        Some(g.sum_axis(Axis(0)).insert_axis(Axis(0)))
    } else if target.cols == 1 && target.rows == g.nrows() {
        Some(g.sum_axis(Axis(1)).insert_axis(Axis(1)))
    } else {
        None
    }
}

pub fn relu_backward(g: ArrayView2<'_, f32>, x: ArrayView2<'_, f32>) -> Array2<f32> {
    Zip::from(&g)
        .and(&x)
        .map_collect(|&g, &x| if x > 0.0 { g } else { 0.0 })
}

/// `y` is the sigmoid output
pub fn sigmoid_backward(g: ArrayView2<'_, f32>, y: ArrayView2<'_, f32>) -> Array2<f32> {
    Zip::from(&g)
        .and(&y)
        .map_collect(|&g, &s| g * s * (1.0 - s))
}

/// `y` is the tanh output
pub fn tanh_backward(g: ArrayView2<'_, f32>, y: ArrayView2<'_, f32>) -> Array2<f32> {
    Zip::from(&g)
        .and(&y)
        .map_collect(|&g, &t| g * (1.0 - t * t))
}

pub fn square_backward(g: ArrayView2<'_, f32>, x: ArrayView2<'_, f32>) -> Array2<f32> {
    Zip::from(&g)
        .and(&x)
        .map_collect(|&g, &x| g * 2.0 * x)
}

/// `g - softmax * rowsum(g)`, with softmax recovered from the stored log-probabilities
pub fn log_softmax_backward(g: ArrayView2<'_, f32>, logp: ArrayView2<'_, f32>) -> Array2<f32> {
    let softmax = logp.mapv(f32::exp);
    let row_sums = g.sum_axis(Axis(1)).insert_axis(Axis(1));
    &g - &(&softmax * &row_sums)
}

pub fn nll_backward(g0: f32, classes: &[usize], shape: Shape) -> Array2<f32> {
    let mut out = Array2::zeros((shape.rows, shape.cols));
    let scale = -g0 / shape.rows as f32;
    for (r, &c) in classes.iter().enumerate() {
        out[[r, c]] = scale;
    }
    out
}
