//! Core types for bounded image decoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for image decoding operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The source format is not recognized or its decoder is not compiled in.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The source is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// Decoding would exceed the configured allocation ceiling.
    #[error("Out of memory during decoding: {0}")]
    OutOfMemory(String),

    /// Probed dimensions are zero on at least one axis.
    #[error("Image has empty dimensions ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// I/O error while reading the source.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<image::ImageError> for DecodeError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Limits(e) => DecodeError::OutOfMemory(e.to_string()),
            image::ImageError::Unsupported(_) => DecodeError::InvalidFormat,
            image::ImageError::IoError(e) => DecodeError::IoError(e.to_string()),
            other => DecodeError::CorruptedFile(other.to_string()),
        }
    }
}

impl From<jpeg_decoder::Error> for DecodeError {
    fn from(err: jpeg_decoder::Error) -> Self {
        match err {
            jpeg_decoder::Error::Unsupported(feature) => {
                DecodeError::CorruptedFile(format!("unsupported JPEG feature: {:?}", feature))
            }
            jpeg_decoder::Error::Io(e) => DecodeError::IoError(e.to_string()),
            other => DecodeError::CorruptedFile(other.to_string()),
        }
    }
}

/// Intrinsic size of an image as reported by its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total pixel count, widened so large sources can't overflow.
    pub fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Width and height exchanged, as seen after a quarter turn.
    pub fn transposed(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            1 => Orientation::Normal,
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// Clockwise rotation needed to display a source upright.
///
/// Only the three pure rotations are corrected; mirrored orientations map to
/// [`Rotation::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }

    /// True for quarter turns, which exchange width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Cw90 | Rotation::Cw270)
    }
}

impl From<Orientation> for Rotation {
    fn from(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Rotate90CW => Rotation::Cw90,
            Orientation::Rotate180 => Rotation::Cw180,
            Orientation::Rotate270CW => Rotation::Cw270,
            _ => Rotation::None,
        }
    }
}

/// A decoded image with RGB pixel data.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGB pixel data in row-major order (3 bytes per pixel).
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * 3,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    /// Consume into an `image::RgbImage` without copying the pixel buffer.
    pub fn into_rgb_image(self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.pixels)
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}

/// Result of a bounded decode: the reduced image plus how it was obtained.
#[derive(Debug, Clone)]
pub struct SampledImage {
    pub image: DecodedImage,
    /// Header dimensions of the source.
    pub source: Dimensions,
    /// Integer divisor applied on both axes.
    pub sample_size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_from_u32() {
        assert_eq!(Orientation::from(1), Orientation::Normal);
        assert_eq!(Orientation::from(3), Orientation::Rotate180);
        assert_eq!(Orientation::from(6), Orientation::Rotate90CW);
        assert_eq!(Orientation::from(8), Orientation::Rotate270CW);
        assert_eq!(Orientation::from(0), Orientation::Normal);
        assert_eq!(Orientation::from(99), Orientation::Normal);
    }

    #[test]
    fn test_rotation_from_orientation() {
        assert_eq!(Rotation::from(Orientation::Rotate90CW).degrees(), 90);
        assert_eq!(Rotation::from(Orientation::Rotate180).degrees(), 180);
        assert_eq!(Rotation::from(Orientation::Rotate270CW).degrees(), 270);

        // Mirrored variants are not corrected
        for o in [
            Orientation::Normal,
            Orientation::FlipHorizontal,
            Orientation::FlipVertical,
            Orientation::Transpose,
            Orientation::Transverse,
        ] {
            assert_eq!(Rotation::from(o), Rotation::None, "{:?}", o);
        }
    }

    #[test]
    fn test_rotation_swaps_dimensions() {
        assert!(!Rotation::None.swaps_dimensions());
        assert!(Rotation::Cw90.swaps_dimensions());
        assert!(!Rotation::Cw180.swaps_dimensions());
        assert!(Rotation::Cw270.swaps_dimensions());
    }

    #[test]
    fn test_dimensions_helpers() {
        let dims = Dimensions::new(70_000, 70_000);
        assert_eq!(dims.pixel_count(), 4_900_000_000);
        assert_eq!(Dimensions::new(4, 3).transposed(), Dimensions::new(3, 4));
    }

    #[test]
    fn test_decoded_image_roundtrip_through_rgb() {
        let img = DecodedImage::new(4, 2, vec![7u8; 4 * 2 * 3]);
        assert!(!img.is_empty());
        assert_eq!(img.dimensions(), Dimensions::new(4, 2));

        let rgb = img.into_rgb_image().unwrap();
        assert_eq!(rgb.dimensions(), (4, 2));
    }

    #[test]
    fn test_decoded_image_empty() {
        let img = DecodedImage::new(0, 0, vec![]);
        assert!(img.is_empty());
    }

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::EmptyImage {
            width: 0,
            height: 10,
        };
        assert_eq!(err.to_string(), "Image has empty dimensions (0x10)");

        let err = DecodeError::InvalidFormat;
        assert_eq!(err.to_string(), "Invalid or unsupported image format");
    }
}
