//! Tensor I/O
//!
//! Two concerns live here:
//!
//! - wire codecs moving a single tensor buffer over a byte stream, either
//!   raw (header-less, shape agreed out of band) or framed (magic, version,
//!   buffer kind and shape ahead of the payload)
//! - parameter checkpoints saving and restoring named parameter tensors in
//!   JSON or YAML

mod codec;
mod format;
mod load;
mod model;
mod save;

#[cfg(test)]
mod tests;

pub use codec::{
    decode_buffer, decode_frame, encode_buffer, encode_frame, read_buffer, read_frame,
    write_buffer, write_frame, Frame, FRAME_HEADER_LEN, FRAME_MAGIC, FRAME_VERSION,
};
pub use format::{ModelFormat, SaveConfig};
pub use load::{load_model, load_state};
pub use model::{Model, ModelMetadata, ModelState, ParameterInfo};
pub use save::save_model;
