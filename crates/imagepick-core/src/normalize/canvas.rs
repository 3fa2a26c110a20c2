//! Rendering a sampled bitmap onto an exact-size canvas.
//!
//! The sampled decode rarely lands on the target size exactly (sample sizes
//! are integers), so the bitmap is drawn centred on the canvas midpoint and
//! scaled by `target / sampled` on each axis.
//!
//! # Algorithm
//!
//! Inverse mapping: for each canvas pixel centre, the scale is undone around
//! the midpoint to find the source coordinate, which is then sampled
//! bilinearly.
//! ```text
//! src_x = (dst_x + 0.5 - mid_x) / ratio_x + src_w / 2 - 0.5
//! src_y = (dst_y + 0.5 - mid_y) / ratio_y + src_h / 2 - 0.5
//! ```

use super::NormalizeError;
use crate::decode::DecodedImage;

/// Allocate a zeroed RGB canvas, reporting allocation failure as an error.
pub fn allocate_canvas(width: u32, height: u32) -> Result<Vec<u8>, NormalizeError> {
    let failed = || NormalizeError::CanvasAllocation { width, height };

    if width == 0 || height == 0 {
        return Err(failed());
    }

    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(failed)?;

    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).map_err(|_| failed())?;
    buffer.resize(len, 0);
    Ok(buffer)
}

/// Draw `src` scaled to exactly `width × height`.
pub fn render_scaled(
    src: &DecodedImage,
    width: u32,
    height: u32,
) -> Result<DecodedImage, NormalizeError> {
    if src.is_empty() {
        return Err(NormalizeError::CanvasAllocation {
            width: src.width,
            height: src.height,
        });
    }

    let mut canvas = allocate_canvas(width, height)?;

    if src.width == width && src.height == height {
        canvas.copy_from_slice(&src.pixels);
        return Ok(DecodedImage::new(width, height, canvas));
    }

    let ratio_x = width as f64 / src.width as f64;
    let ratio_y = height as f64 / src.height as f64;
    let mid_x = width as f64 / 2.0;
    let mid_y = height as f64 / 2.0;
    let half_w = src.width as f64 / 2.0;
    let half_h = src.height as f64 / 2.0;

    for dst_y in 0..height {
        let src_y = (dst_y as f64 + 0.5 - mid_y) / ratio_y + half_h - 0.5;
        for dst_x in 0..width {
            let src_x = (dst_x as f64 + 0.5 - mid_x) / ratio_x + half_w - 0.5;

            let idx = (dst_y as usize * width as usize + dst_x as usize) * 3;
            canvas[idx..idx + 3].copy_from_slice(&sample_bilinear(src, src_x, src_y));
        }
    }

    Ok(DecodedImage::new(width, height, canvas))
}

#[inline]
fn get_pixel_f64(image: &DecodedImage, px: usize, py: usize) -> [f64; 3] {
    let idx = (py * image.width as usize + px) * 3;
    [
        image.pixels[idx] as f64,
        image.pixels[idx + 1] as f64,
        image.pixels[idx + 2] as f64,
    ]
}

/// Bilinear sample with coordinates clamped to the image edge.
fn sample_bilinear(image: &DecodedImage, x: f64, y: f64) -> [u8; 3] {
    let max_x = (image.width - 1) as f64;
    let max_y = (image.height - 1) as f64;
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(image.width as usize - 1);
    let y1 = (y0 + 1).min(image.height as usize - 1);

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = get_pixel_f64(image, x0, y0);
    let p10 = get_pixel_f64(image, x1, y0);
    let p01 = get_pixel_f64(image, x0, y1);
    let p11 = get_pixel_f64(image, x1, y1);

    let mut result = [0u8; 3];
    for i in 0..3 {
        let v = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
        result[i] = v.clamp(0.0, 255.0).round() as u8;
    }

    result
}
