//! Bounded-memory decoding for the normalization pipeline.
//!
//! This module provides functionality for:
//! - Probing intrinsic dimensions from an image header
//! - Choosing an integer sample size for a target rectangle
//! - Decoding JPEG at a reduced DCT scale, other formats under an allocation
//!   ceiling, and reducing by the sample size
//! - Reading EXIF orientation and rotating to upright
//!
//! # Examples
//!
//! ```ignore
//! use imagepick_core::decode::{decode_bounded, rotation_for, DecodeBudget};
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let sampled = decode_bounded(&bytes, 612, 459, &DecodeBudget::default()).unwrap();
//! let rotation = rotation_for(&bytes);
//! println!("{}x{} at 1/{}, rotate {}", sampled.image.width, sampled.image.height,
//!     sampled.sample_size, rotation.degrees());
//! ```

mod orientation;
mod sampled;
mod types;

pub use orientation::{apply_rotation, get_orientation, rotation_for};
pub use sampled::{
    calculate_in_sample_size, dct_divisor, decode_bounded, probe, sampled_dimensions,
    DecodeBudget,
};
pub use types::{DecodeError, DecodedImage, Dimensions, Orientation, Rotation, SampledImage};
