//! Output encoding for the normalization pipeline.
//!
//! - JPEG for the final compressed result
//! - PNG for the lossless intermediate written by the store stage

mod jpeg;
mod png;

pub use jpeg::{encode_image_jpeg, encode_jpeg, EncodeError};
pub use png::encode_image_png;
