//! Lossless PNG encoding for the store stage of the two-stage write.

use image::codecs::png::PngEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;

use super::jpeg::{validate_rgb, EncodeError};
use crate::decode::DecodedImage;

/// Encode a decoded image to PNG bytes.
pub fn encode_image_png(image: &DecodedImage) -> Result<Vec<u8>, EncodeError> {
    validate_rgb(&image.pixels, image.width, image.height)?;

    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(
            &image.pixels,
            image.width,
            image.height,
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer)
}
