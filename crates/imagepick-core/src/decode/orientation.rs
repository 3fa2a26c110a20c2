//! EXIF orientation lookup and upright rotation.
//!
//! Rotation correction is best-effort: a source without EXIF data, or with
//! a damaged orientation field, is treated as already upright.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use tracing::debug;

use super::{DecodedImage, Orientation, Rotation};

/// Extract the EXIF orientation from encoded image bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or the tag can't
/// be read.
pub fn get_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(e) => {
            debug!(error = %e, "no readable EXIF, assuming upright");
            Orientation::Normal
        }
    }
}

/// Rotation needed to display the source upright: tag 6 → 90°, 3 → 180°,
/// 8 → 270°, anything else → 0°.
pub fn rotation_for(bytes: &[u8]) -> Rotation {
    Rotation::from(get_orientation(bytes))
}

/// Rotate an image clockwise by `rotation`.
pub fn apply_rotation(image: DecodedImage, rotation: Rotation) -> DecodedImage {
    if rotation == Rotation::None {
        return image;
    }

    let Some(rgb) = image.into_rgb_image() else {
        return DecodedImage::new(0, 0, Vec::new());
    };

    let rotated = match rotation {
        Rotation::None => rgb,
        Rotation::Cw90 => image::imageops::rotate90(&rgb),
        Rotation::Cw180 => image::imageops::rotate180(&rgb),
        Rotation::Cw270 => image::imageops::rotate270(&rgb),
    };

    DecodedImage::from_rgb_image(rotated)
}
