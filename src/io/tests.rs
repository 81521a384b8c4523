//! Checkpoint and codec tests

use super::*;
use crate::autograd::{ops, ArenaId, Buffer, Context, Shape, Tensor};
use crate::Error;
use std::io::Cursor;
use tempfile::NamedTempFile;

fn setup() -> (Context, ArenaId) {
    let mut ctx = Context::new();
    let arena = ctx.create_arena(1 << 14).unwrap();
    (ctx, arena)
}

fn tensor(ctx: &mut Context, arena: ArenaId, shape: Shape, values: &[f32]) -> Tensor {
    ops::from_slice(ctx, arena, shape, values, true).unwrap()
}

#[test]
fn test_full_workflow_json() {
    let (mut ctx, arena) = setup();
    let weight = tensor(&mut ctx, arena, Shape::new(1, 3), &[1.0, 2.0, 3.0]);
    let bias = ops::from_slice(&mut ctx, arena, Shape::SCALAR, &[0.5], false).unwrap();
    let model = Model::new(
        ModelMetadata::new("integration-test", "linear"),
        vec![("weight".to_string(), weight), ("bias".to_string(), bias)],
    );

    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().with_extension("json");
    save_model(&ctx, &model, &path, &SaveConfig::new(ModelFormat::Json)).unwrap();

    let other = ctx.create_arena(1 << 14).unwrap();
    let loaded = load_model(&mut ctx, other, &path).unwrap();

    assert_eq!(loaded.metadata, model.metadata);
    assert_eq!(loaded.parameters.len(), 2);
    let loaded_weight = loaded.get_parameter("weight").unwrap();
    assert_eq!(ctx.data(loaded_weight).unwrap(), ctx.data(weight).unwrap());
    assert!(!ctx.requires_grad(loaded.get_parameter("bias").unwrap()).unwrap());

    std::fs::remove_file(path).ok();
}

#[test]
fn test_full_workflow_yaml_restore() {
    let (mut ctx, arena) = setup();
    let w1 = tensor(&mut ctx, arena, Shape::new(2, 2), &[0.15, -0.61, -0.26, 0.35]);
    let w2 = tensor(&mut ctx, arena, Shape::new(2, 1), &[-0.45, 0.96]);
    let model = Model::new(
        ModelMetadata::new("yaml-test", "dual-layer"),
        vec![("w1".to_string(), w1), ("w2".to_string(), w2)],
    );

    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().with_extension("yml");
    save_model(&ctx, &model, &path, &SaveConfig::new(ModelFormat::Yaml)).unwrap();

    ctx.data_mut(w1).unwrap().fill(0.0);
    ctx.data_mut(w2).unwrap().fill(0.0);
    model.restore(&mut ctx, &load_state(&path).unwrap()).unwrap();

    assert_eq!(ctx.data(w1).unwrap(), &[0.15, -0.61, -0.26, 0.35]);
    assert_eq!(ctx.data(w2).unwrap(), &[-0.45, 0.96]);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_compact_json_is_single_line() {
    let (mut ctx, arena) = setup();
    let w = tensor(&mut ctx, arena, Shape::new(1, 2), &[1.0, 2.0]);
    let model = Model::new(ModelMetadata::new("compact", "linear"), vec![("w".to_string(), w)]);

    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().with_extension("json");
    let config = SaveConfig::new(ModelFormat::Json).with_pretty(false);
    save_model(&ctx, &model, &path, &config).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(content.contains("compact"));

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_rejects_unknown_extension() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().with_extension("bin");
    std::fs::write(&path, b"{}").unwrap();

    assert!(matches!(load_state(&path), Err(Error::Serialization(_))));

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_rejects_garbage() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().with_extension("json");
    std::fs::write(&path, "not json").unwrap();

    assert!(matches!(load_state(&path), Err(Error::Serialization(_))));

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    assert!(matches!(load_state(&path), Err(Error::Io(_))));
}

// Codecs

#[test]
fn test_raw_encoding_is_little_endian_row_major() {
    let (mut ctx, arena) = setup();
    let t = tensor(&mut ctx, arena, Shape::new(1, 2), &[1.0, -2.0]);

    let bytes = encode_buffer(&ctx, t, Buffer::Data).unwrap();
    let mut expected = 1.0f32.to_le_bytes().to_vec();
    expected.extend_from_slice(&(-2.0f32).to_le_bytes());
    assert_eq!(bytes, expected);
}

#[test]
fn test_raw_stream_moves_gradient_between_tensors() {
    let (mut ctx, arena) = setup();
    let src = tensor(&mut ctx, arena, Shape::new(2, 2), &[0.0; 4]);
    ctx.grad_mut(src).unwrap().copy_from_slice(&[0.5, 1.5, -2.5, 3.0]);
    let dst = tensor(&mut ctx, arena, Shape::new(2, 2), &[0.0; 4]);

    let mut wire = Vec::new();
    write_buffer(&ctx, src, Buffer::Gradient, &mut wire).unwrap();
    read_buffer(&mut ctx, dst, Buffer::Data, &mut Cursor::new(wire)).unwrap();

    assert_eq!(ctx.data(dst).unwrap(), &[0.5, 1.5, -2.5, 3.0]);
}

#[test]
fn test_raw_decode_rejects_wrong_length() {
    let (mut ctx, arena) = setup();
    let t = tensor(&mut ctx, arena, Shape::new(1, 2), &[7.0, 8.0]);

    let err = decode_buffer(&mut ctx, t, Buffer::Data, &[0u8; 4]).unwrap_err();
    assert!(matches!(err, Error::LengthMismatch { expected: 8, got: 4 }));
    assert_eq!(ctx.data(t).unwrap(), &[7.0, 8.0]);
}

#[test]
fn test_raw_read_short_stream_is_io_error() {
    let (mut ctx, arena) = setup();
    let t = tensor(&mut ctx, arena, Shape::new(1, 2), &[7.0, 8.0]);

    let err = read_buffer(&mut ctx, t, Buffer::Data, &mut Cursor::new(vec![0u8; 5])).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(ctx.data(t).unwrap(), &[7.0, 8.0]);
}

#[test]
fn test_frame_header_layout() {
    let (mut ctx, arena) = setup();
    let t = tensor(&mut ctx, arena, Shape::new(2, 3), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

    let bytes = encode_frame(&ctx, t, Buffer::Gradient).unwrap();
    assert_eq!(bytes.len(), FRAME_HEADER_LEN + 6 * 4);
    assert_eq!(&bytes[..4], b"NFNN");
    assert_eq!(bytes[4], FRAME_VERSION);
    assert_eq!(bytes[5], 1);
    assert_eq!(&bytes[6..10], &2u32.to_le_bytes());
    assert_eq!(&bytes[10..14], &3u32.to_le_bytes());
}

#[test]
fn test_frame_stream_restores_into_matching_tensor() {
    let (mut ctx, arena) = setup();
    let src = tensor(&mut ctx, arena, Shape::new(2, 1), &[3.0, -4.0]);
    let dst = tensor(&mut ctx, arena, Shape::new(2, 1), &[0.0, 0.0]);

    let mut wire = Vec::new();
    write_frame(&ctx, src, Buffer::Data, &mut wire).unwrap();
    let frame = read_frame(&mut Cursor::new(wire)).unwrap();

    assert_eq!(frame.shape, Shape::new(2, 1));
    assert_eq!(frame.buffer, Buffer::Data);
    frame.apply(&mut ctx, dst).unwrap();
    assert_eq!(ctx.data(dst).unwrap(), &[3.0, -4.0]);
}

#[test]
fn test_frame_apply_checks_shape() {
    let (mut ctx, arena) = setup();
    let src = tensor(&mut ctx, arena, Shape::new(1, 2), &[1.0, 2.0]);
    let dst = tensor(&mut ctx, arena, Shape::new(2, 1), &[0.0, 0.0]);

    let frame = decode_frame(&encode_frame(&ctx, src, Buffer::Data).unwrap()).unwrap();
    assert!(matches!(
        frame.apply(&mut ctx, dst),
        Err(Error::ShapeMismatch { op: "Frame", .. })
    ));
}

#[test]
fn test_frame_apply_checks_value_count() {
    let (mut ctx, arena) = setup();
    let dst = tensor(&mut ctx, arena, Shape::new(2, 2), &[1.0, 2.0, 3.0, 4.0]);

    let frame = Frame {
        buffer: Buffer::Data,
        shape: Shape::new(2, 2),
        values: vec![9.0; 3],
    };
    assert!(matches!(
        frame.apply(&mut ctx, dst),
        Err(Error::LengthMismatch { expected: 4, got: 3 })
    ));
    assert_eq!(ctx.data(dst).unwrap(), &[1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_decode_from_unaligned_bytes() {
    let (mut ctx, arena) = setup();
    let t = tensor(&mut ctx, arena, Shape::new(1, 3), &[0.25, -8.0, 1e-3]);
    let dst = tensor(&mut ctx, arena, Shape::new(1, 3), &[0.0; 3]);

    // shift the payload off any word boundary
    let mut shifted = vec![0u8];
    shifted.extend_from_slice(&encode_frame(&ctx, t, Buffer::Data).unwrap());
    let frame = decode_frame(&shifted[1..]).unwrap();
    assert_eq!(frame.values, vec![0.25, -8.0, 1e-3]);

    let mut raw = vec![0u8; 3];
    raw.extend_from_slice(&encode_buffer(&ctx, t, Buffer::Data).unwrap());
    decode_buffer(&mut ctx, dst, Buffer::Data, &raw[3..]).unwrap();
    assert_eq!(ctx.data(dst).unwrap(), &[0.25, -8.0, 1e-3]);
}

#[test]
fn test_decode_frame_rejects_corruption() {
    let (mut ctx, arena) = setup();
    let t = tensor(&mut ctx, arena, Shape::new(1, 2), &[1.0, 2.0]);
    let good = encode_frame(&ctx, t, Buffer::Data).unwrap();

    let mut bad_magic = good.clone();
    bad_magic[0] = b'X';
    let mut bad_version = good.clone();
    bad_version[4] = 9;
    let mut bad_kind = good.clone();
    bad_kind[5] = 2;
    let mut zero_rows = good.clone();
    zero_rows[6..10].copy_from_slice(&0u32.to_le_bytes());
    let mut trailing = good.clone();
    trailing.push(0);

    for bytes in [
        bad_magic,
        bad_version,
        bad_kind,
        zero_rows,
        trailing,
        good[..FRAME_HEADER_LEN - 1].to_vec(),
        good[..good.len() - 1].to_vec(),
    ] {
        assert!(matches!(decode_frame(&bytes), Err(Error::Serialization(_))));
    }
}

#[test]
fn test_read_frame_truncated_payload() {
    let (mut ctx, arena) = setup();
    let t = tensor(&mut ctx, arena, Shape::new(1, 2), &[1.0, 2.0]);
    let mut wire = encode_frame(&ctx, t, Buffer::Data).unwrap();
    wire.truncate(wire.len() - 2);

    assert!(matches!(
        read_frame(&mut Cursor::new(wire)),
        Err(Error::Io(_))
    ));
}
