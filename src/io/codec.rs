//! Byte codecs for moving a tensor buffer over a stream
//!
//! Values are little-endian `f32`s in row-major order. The raw codec writes
//! nothing else, so both ends must already agree on the shape. The framed
//! codec prefixes a fixed header:
//!
//! ```text
//! magic "NFNN" | version u8 | kind u8 | rows u32 LE | cols u32 LE | payload
//! ```

use crate::arena::WORD;
use crate::autograd::{Buffer, Context, Shape, Tensor};
use crate::{Error, Result};
use std::io::{Read, Write};

pub const FRAME_MAGIC: [u8; 4] = *b"NFNN";
pub const FRAME_VERSION: u8 = 1;
pub const FRAME_HEADER_LEN: usize = 14;

fn buffer_kind(buffer: Buffer) -> u8 {
    match buffer {
        Buffer::Data => 0,
        Buffer::Gradient => 1,
    }
}

fn kind_buffer(kind: u8) -> Result<Buffer> {
    match kind {
        0 => Ok(Buffer::Data),
        1 => Ok(Buffer::Gradient),
        other => Err(Error::Serialization(format!(
            "unknown buffer kind {}",
            other
        ))),
    }
}

fn to_bytes(values: &[f32]) -> Vec<u8> {
    let mut bytes = bytemuck::cast_slice::<f32, u8>(values).to_vec();
    if cfg!(target_endian = "big") {
        for word in bytes.chunks_exact_mut(WORD) {
            word.reverse();
        }
    }
    bytes
}

/// Overwrite `target` from little-endian bytes; lengths must already agree
fn fill_from_bytes(target: &mut [f32], bytes: &[u8]) {
    bytemuck::cast_slice_mut::<f32, u8>(target).copy_from_slice(bytes);
    if cfg!(target_endian = "big") {
        for x in target.iter_mut() {
            *x = f32::from_bits(u32::from_le(x.to_bits()));
        }
    }
}

fn from_bytes(bytes: &[u8]) -> Vec<f32> {
    let mut values = vec![0.0; bytes.len() / WORD];
    fill_from_bytes(&mut values, bytes);
    values
}

fn read_u32(bytes: &[u8]) -> usize {
    u32::from_le(bytemuck::pod_read_unaligned(bytes)) as usize
}

/// Encode one buffer of `t` with no header
pub fn encode_buffer(ctx: &Context, t: Tensor, buffer: Buffer) -> Result<Vec<u8>> {
    Ok(to_bytes(ctx.buffer(t, buffer)?))
}

/// Overwrite one buffer of `t` from header-less bytes
///
/// `bytes` must hold exactly `len(t)` values.
pub fn decode_buffer(ctx: &mut Context, t: Tensor, buffer: Buffer, bytes: &[u8]) -> Result<()> {
    let target = ctx.buffer_mut(t, buffer)?;
    if bytes.len() != target.len() * WORD {
        return Err(Error::LengthMismatch {
            expected: target.len() * WORD,
            got: bytes.len(),
        });
    }
    fill_from_bytes(target, bytes);
    Ok(())
}

/// Write one buffer of `t` to `writer` with no header
pub fn write_buffer<W: Write>(
    ctx: &Context,
    t: Tensor,
    buffer: Buffer,
    writer: &mut W,
) -> Result<()> {
    writer.write_all(&encode_buffer(ctx, t, buffer)?)?;
    Ok(())
}

/// Fill one buffer of `t` from exactly `len(t)` values read from `reader`
///
/// A short stream is an I/O error and leaves the buffer untouched.
pub fn read_buffer<R: Read>(
    ctx: &mut Context,
    t: Tensor,
    buffer: Buffer,
    reader: &mut R,
) -> Result<()> {
    let mut bytes = vec![0u8; ctx.byte_size(t)?];
    reader.read_exact(&mut bytes)?;
    decode_buffer(ctx, t, buffer, &bytes)
}

/// A decoded framed buffer
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub buffer: Buffer,
    pub shape: Shape,
    pub values: Vec<f32>,
}

impl Frame {
    /// Copy the frame's values into the matching buffer of `t`
    pub fn apply(&self, ctx: &mut Context, t: Tensor) -> Result<()> {
        let shape = ctx.shape(t)?;
        if shape != self.shape {
            return Err(Error::ShapeMismatch {
                op: "Frame",
                left: shape,
                right: self.shape,
            });
        }
        if self.values.len() != shape.len() {
            return Err(Error::LengthMismatch {
                expected: shape.len(),
                got: self.values.len(),
            });
        }
        ctx.buffer_mut(t, self.buffer)?
            .copy_from_slice(&self.values);
        Ok(())
    }
}

/// Encode one buffer of `t` behind a frame header
pub fn encode_frame(ctx: &Context, t: Tensor, buffer: Buffer) -> Result<Vec<u8>> {
    let shape = ctx.shape(t)?;
    let dims = |n: usize| {
        u32::try_from(n)
            .map_err(|_| Error::Serialization(format!("dimension {} does not fit a frame", n)))
    };
    let (rows, cols) = (dims(shape.rows)?, dims(shape.cols)?);

    let mut bytes = Vec::with_capacity(FRAME_HEADER_LEN + shape.byte_size());
    bytes.extend_from_slice(&FRAME_MAGIC);
    bytes.push(FRAME_VERSION);
    bytes.push(buffer_kind(buffer));
    bytes.extend_from_slice(&rows.to_le_bytes());
    bytes.extend_from_slice(&cols.to_le_bytes());
    bytes.extend_from_slice(&encode_buffer(ctx, t, buffer)?);
    Ok(bytes)
}

/// Parse a frame header, returning the buffer kind and shape
fn parse_header(header: &[u8]) -> Result<(Buffer, Shape)> {
    if header.len() < FRAME_HEADER_LEN {
        return Err(Error::Serialization(format!(
            "frame header needs {} bytes, got {}",
            FRAME_HEADER_LEN,
            header.len()
        )));
    }
    if header[..4] != FRAME_MAGIC {
        return Err(Error::Serialization("bad frame magic".to_string()));
    }
    if header[4] != FRAME_VERSION {
        return Err(Error::Serialization(format!(
            "unsupported frame version {}",
            header[4]
        )));
    }
    let buffer = kind_buffer(header[5])?;
    let rows = read_u32(&header[6..10]);
    let cols = read_u32(&header[10..14]);
    let invalid = || Error::Serialization(format!("invalid frame shape {}x{}", rows, cols));
    let shape = Shape::new(rows, cols).validate().map_err(|_| invalid())?;
    rows.checked_mul(cols)
        .and_then(|n| n.checked_mul(WORD))
        .ok_or_else(invalid)?;
    Ok((buffer, shape))
}

/// Decode a complete frame; trailing bytes are rejected
pub fn decode_frame(bytes: &[u8]) -> Result<Frame> {
    let (buffer, shape) = parse_header(bytes)?;
    let payload = &bytes[FRAME_HEADER_LEN..];
    if payload.len() != shape.byte_size() {
        return Err(Error::Serialization(format!(
            "frame payload for {} needs {} bytes, got {}",
            shape,
            shape.byte_size(),
            payload.len()
        )));
    }
    Ok(Frame {
        buffer,
        shape,
        values: from_bytes(payload),
    })
}

pub fn write_frame<W: Write>(
    ctx: &Context,
    t: Tensor,
    buffer: Buffer,
    writer: &mut W,
) -> Result<()> {
    writer.write_all(&encode_frame(ctx, t, buffer)?)?;
    Ok(())
}

/// Read exactly one frame from `reader`
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Frame> {
    let mut header = [0u8; FRAME_HEADER_LEN];
    reader.read_exact(&mut header)?;
    let (buffer, shape) = parse_header(&header)?;

    // Grow with the stream rather than trusting the header's size up front
    let expected = shape.byte_size();
    let mut payload = Vec::new();
    reader.take(expected as u64).read_to_end(&mut payload)?;
    if payload.len() != expected {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("frame payload truncated at {} of {} bytes", payload.len(), expected),
        )
        .into());
    }
    Ok(Frame {
        buffer,
        shape,
        values: from_bytes(&payload),
    })
}
