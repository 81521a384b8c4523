#![no_main]

use libfuzzer_sys::fuzz_target;
use nfnn::io::{decode_frame, encode_frame, read_frame};
use nfnn::Context;

/// Fuzz target for the framed tensor codec
///
/// Arbitrary bytes must decode to a frame or an error. A decoded frame
/// re-encodes to the same bytes.
fuzz_target!(|data: &[u8]| {
    let streamed = read_frame(&mut &data[..]);

    let Ok(frame) = decode_frame(data) else { return };
    assert!(streamed.is_ok());
    if frame.shape.len() > 1 << 16 {
        return;
    }

    let mut ctx = Context::new();
    let arena = ctx.create_arena(frame.shape.byte_size() * 2 + 64).unwrap();
    let t = ctx.create_tensor(arena, frame.shape, false).unwrap();
    frame.apply(&mut ctx, t).unwrap();

    let again = encode_frame(&ctx, t, frame.buffer).unwrap();
    assert_eq!(again.as_slice(), data);
});
