#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use nfnn::autograd::{backward, ops};
use nfnn::{Context, Shape};

/// Fuzz target for tensor operations
///
/// Builds small graphs from arbitrary shapes and values. Shape errors must
/// come back as `Err`, never as a panic, and a successful backward pass must
/// leave the step arena exactly where it started after rollback.

#[derive(Arbitrary, Debug)]
struct TensorOpFuzzInput {
    rows_a: u8,
    cols_a: u8,
    rows_b: u8,
    cols_b: u8,
    values: Vec<u8>,
    op_type: u8,
    arena_kib: u8,
}

fn bytes_to_f32(bytes: &[u8], len: usize) -> Vec<f32> {
    // Map 0..255 to -10.0..10.0, cycling when the input runs short
    (0..len)
        .map(|i| {
            let b = bytes.get(i % bytes.len().max(1)).copied().unwrap_or(0);
            ((b as f32) / 255.0) * 20.0 - 10.0
        })
        .collect()
}

fuzz_target!(|input: TensorOpFuzzInput| {
    let dim = |d: u8| (d % 8) as usize + 1;
    let shape_a = Shape::new(dim(input.rows_a), dim(input.cols_a));
    let shape_b = Shape::new(dim(input.rows_b), dim(input.cols_b));

    let mut ctx = Context::new();
    let Ok(params) = ctx.create_arena(1 << 14) else { return };
    let Ok(scratch) = ctx.create_arena((input.arena_kib as usize + 1) * 256) else { return };

    let a = ops::from_slice(&mut ctx, params, shape_a, &bytes_to_f32(&input.values, shape_a.len()), true)
        .unwrap();
    let b = ops::from_slice(&mut ctx, params, shape_b, &bytes_to_f32(&input.values, shape_b.len()), true)
        .unwrap();

    let used = ctx.arena(scratch).unwrap().used();
    ctx.checkpoint(scratch).unwrap();

    let out = match input.op_type % 8 {
        0 => ops::add(&mut ctx, scratch, a, b),
        1 => ops::sub(&mut ctx, scratch, a, b),
        2 => ops::mul(&mut ctx, scratch, a, b),
        3 => ops::matmul(&mut ctx, scratch, a, b),
        4 => ops::relu(&mut ctx, scratch, a).and_then(|r| ops::add(&mut ctx, scratch, r, b)),
        5 => ops::tanh(&mut ctx, scratch, a).and_then(|t| ops::matmul(&mut ctx, scratch, t, b)),
        6 => ops::log_softmax(&mut ctx, scratch, a, 1),
        7 => ops::sigmoid(&mut ctx, scratch, a).and_then(|s| ops::square(&mut ctx, scratch, s)),
        _ => unreachable!(),
    };

    if let Ok(out) = out {
        if let Ok(loss) = ops::sum_all(&mut ctx, scratch, out) {
            backward(&mut ctx, loss).unwrap();
            assert!(ctx.grad(a).unwrap().iter().all(|g| !g.is_nan()));
        }
    }

    ctx.rollback(scratch).unwrap();
    assert_eq!(ctx.arena(scratch).unwrap().used(), used);
});
