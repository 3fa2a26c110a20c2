//! Bounded decoding with an integer sample size.
//!
//! The header is probed first so the sample size can be chosen before any
//! pixel storage exists.
//!
//! JPEG sources are decoded in the DCT domain at 1/8, 1/4 or 1/2 scale,
//! picking the smallest scale that doesn't go below `source / sample_size`,
//! so the full-resolution bitmap is never allocated. Other formats are
//! decoded at full size under an allocation ceiling. A source too large for
//! the ceiling fails with [`DecodeError::OutOfMemory`] instead of aborting
//! the process. Either way the result is resized to exactly
//! `source / sample_size` before being returned.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{ImageFormat, ImageReader, Limits, RgbImage};
use jpeg_decoder::PixelFormat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DecodeError, DecodedImage, Dimensions, SampledImage};

/// Memory policy for a bounded decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeBudget {
    /// Decoded pixel count may reach `pixel_factor` times the target's.
    pub pixel_factor: u32,
    /// Largest allocation the decoder may make, in bytes.
    pub max_alloc: u64,
}

impl Default for DecodeBudget {
    fn default() -> Self {
        Self {
            pixel_factor: 2,
            max_alloc: 256 * 1024 * 1024,
        }
    }
}

/// Reduction factors JPEG can apply while decoding, largest first.
const DCT_DIVISORS: [u32; 4] = [8, 4, 2, 1];

fn open_reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::IoError(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }
    Ok(reader)
}

fn probe_with_format(bytes: &[u8]) -> Result<(Dimensions, Option<ImageFormat>), DecodeError> {
    let reader = open_reader(bytes)?;
    let format = reader.format();
    let (width, height) = reader.into_dimensions()?;
    if width == 0 || height == 0 {
        return Err(DecodeError::EmptyImage { width, height });
    }
    Ok((Dimensions::new(width, height), format))
}

/// Read intrinsic dimensions from the image header without decoding pixels.
pub fn probe(bytes: &[u8]) -> Result<Dimensions, DecodeError> {
    probe_with_format(bytes).map(|(dims, _)| dims)
}

/// Compute the decode-time downscale divisor for a source and target.
///
/// Starts from the smaller of the rounded per-axis ratios (never below 1),
/// then grows until `source pixels / sample²` fits within
/// `pixel_factor × target pixels`.
pub fn calculate_in_sample_size(
    source: Dimensions,
    target_width: u32,
    target_height: u32,
    pixel_factor: u32,
) -> u32 {
    if target_width == 0 || target_height == 0 {
        return 1;
    }

    let mut sample_size = 1u32;

    if source.height > target_height || source.width > target_width {
        let height_ratio = (source.height as f64 / target_height as f64).round() as u32;
        let width_ratio = (source.width as f64 / target_width as f64).round() as u32;
        sample_size = height_ratio.min(width_ratio).max(1);
    }

    let total_pixels = source.pixel_count() as f64;
    let pixel_cap = target_width as f64 * target_height as f64 * pixel_factor.max(1) as f64;

    while total_pixels / (sample_size as f64 * sample_size as f64) > pixel_cap {
        sample_size += 1;
    }

    sample_size
}

/// Dimensions of a source reduced by `sample_size` on both axes.
pub fn sampled_dimensions(source: Dimensions, sample_size: u32) -> Dimensions {
    let s = sample_size.max(1);
    Dimensions::new((source.width / s).max(1), (source.height / s).max(1))
}

/// Largest DCT reduction factor that doesn't exceed `sample_size`.
pub fn dct_divisor(sample_size: u32) -> u32 {
    DCT_DIVISORS
        .into_iter()
        .find(|&d| d <= sample_size.max(1))
        .unwrap_or(1)
}

/// Decode `bytes` no larger than needed for a `target_width × target_height`
/// rendering.
///
/// # Errors
///
/// * `DecodeError::InvalidFormat` if the format can't be recognized
/// * `DecodeError::OutOfMemory` if the decode would exceed `budget.max_alloc`
/// * `DecodeError::CorruptedFile` if the pixel data is damaged
pub fn decode_bounded(
    bytes: &[u8],
    target_width: u32,
    target_height: u32,
    budget: &DecodeBudget,
) -> Result<SampledImage, DecodeError> {
    let (source, format) = probe_with_format(bytes)?;
    let sample_size =
        calculate_in_sample_size(source, target_width, target_height, budget.pixel_factor);

    let decoded = match format {
        Some(ImageFormat::Jpeg) => decode_jpeg_scaled(bytes, source, sample_size, budget)?,
        _ => decode_full(bytes, budget)?,
    };

    let reduced = sampled_dimensions(source, sample_size);
    let decoded_dims = decoded.dimensions();
    let rgb = if decoded_dims == (reduced.width, reduced.height) {
        decoded
    } else {
        image::imageops::resize(&decoded, reduced.width, reduced.height, FilterType::Triangle)
    };

    debug!(
        source_width = source.width,
        source_height = source.height,
        sample_size,
        decoded_width = decoded_dims.0,
        decoded_height = decoded_dims.1,
        "bounded decode"
    );

    Ok(SampledImage {
        image: DecodedImage::from_rgb_image(rgb),
        source,
        sample_size,
    })
}

/// Full-size decode through `image`, capped by `budget.max_alloc`.
fn decode_full(bytes: &[u8], budget: &DecodeBudget) -> Result<RgbImage, DecodeError> {
    let mut reader = open_reader(bytes)?;
    let mut limits = Limits::default();
    limits.max_alloc = Some(budget.max_alloc);
    reader.limits(limits);

    Ok(reader.decode()?.into_rgb8())
}

/// JPEG decode with DCT-domain scaling by [`dct_divisor`].
fn decode_jpeg_scaled(
    bytes: &[u8],
    source: Dimensions,
    sample_size: u32,
    budget: &DecodeBudget,
) -> Result<RgbImage, DecodeError> {
    let divisor = dct_divisor(sample_size);
    let scaled = Dimensions::new(
        source.width.div_ceil(divisor),
        source.height.div_ceil(divisor),
    );

    let needed = scaled.pixel_count() * 4;
    if needed > budget.max_alloc {
        return Err(DecodeError::OutOfMemory(format!(
            "{}x{} JPEG at 1/{} needs {} bytes, limit is {}",
            source.width, source.height, divisor, needed, budget.max_alloc
        )));
    }

    let mut decoder = jpeg_decoder::Decoder::new(Cursor::new(bytes));
    decoder.read_info()?;
    if divisor > 1 {
        let requested_width = u16::try_from(scaled.width).unwrap_or(u16::MAX);
        let requested_height = u16::try_from(scaled.height).unwrap_or(u16::MAX);
        decoder.scale(requested_width, requested_height)?;
    }

    let pixels = decoder.decode()?;
    let info = decoder
        .info()
        .ok_or_else(|| DecodeError::CorruptedFile("JPEG header missing".to_string()))?;
    let (width, height) = (info.width as u32, info.height as u32);

    let rgb = match info.pixel_format {
        PixelFormat::RGB24 => pixels,
        PixelFormat::L8 => pixels.iter().flat_map(|&l| [l, l, l]).collect(),
        // Big-endian samples; keep the high byte
        PixelFormat::L16 => pixels
            .chunks_exact(2)
            .flat_map(|c| [c[0], c[0], c[0]])
            .collect(),
        PixelFormat::CMYK32 => pixels
            .chunks_exact(4)
            .flat_map(|c| {
                let k = 255 - c[3] as u32;
                [c[0], c[1], c[2]].map(|v| ((255 - v as u32) * k / 255) as u8)
            })
            .collect(),
    };

    RgbImage::from_raw(width, height, rgb).ok_or_else(|| {
        DecodeError::CorruptedFile(format!("JPEG buffer doesn't match {}x{}", width, height))
    })
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn source_strategy() -> impl Strategy<Value = Dimensions> {
        (1u32..=12_000, 1u32..=12_000).prop_map(|(w, h)| Dimensions::new(w, h))
    }

    fn target_strategy() -> impl Strategy<Value = (u32, u32)> {
        (1u32..=1_000, 1u32..=1_000)
    }

    proptest! {
        /// Property: sample size is at least 1 and the sampled pixel count fits the budget.
        #[test]
        fn prop_sample_size_respects_budget(
            source in source_strategy(),
            (tw, th) in target_strategy(),
        ) {
            let s = calculate_in_sample_size(source, tw, th, 2);
            prop_assert!(s >= 1);

            let sampled = source.pixel_count() as f64 / (s as f64 * s as f64);
            prop_assert!(sampled <= 2.0 * tw as f64 * th as f64);

            let reduced = sampled_dimensions(source, s);
            prop_assert!(reduced.pixel_count() as f64 <= (2.0 * tw as f64 * th as f64).max(1.0));
        }

        /// Property: a source that fits the target is never downsampled.
        #[test]
        fn prop_fitting_source_uses_sample_size_one(
            (tw, th) in target_strategy(),
            fx in 0.01f64..=1.0,
            fy in 0.01f64..=1.0,
        ) {
            let w = ((tw as f64 * fx) as u32).max(1);
            let h = ((th as f64 * fy) as u32).max(1);
            prop_assert_eq!(calculate_in_sample_size(Dimensions::new(w, h), tw, th, 2), 1);
        }
    }
}
