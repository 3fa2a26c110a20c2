//! Shared fixtures for the imagepick test suite.
//!
//! Everything here is generated in memory so tests don't depend on binary
//! fixture files.

use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Gradient image, distinct enough that JPEG doesn't flatten it.
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            ((x * 255) / width.max(1)) as u8,
            ((y * 255) / height.max(1)) as u8,
            128,
        ])
    })
}

/// Left half red, right half blue. Used to check visual orientation.
pub fn split_red_blue(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgb([255, 0, 0])
        } else {
            Rgb([0, 0, 255])
        }
    })
}

pub fn encode_as(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn encode_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    encode_as(&gradient(width, height), ImageFormat::Jpeg)
}

pub fn encode_test_png(width: u32, height: u32) -> Vec<u8> {
    encode_as(&gradient(width, height), ImageFormat::Png)
}

/// Splice an APP1 EXIF segment carrying `orientation` right after SOI.
pub fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    assert_eq!(&jpeg[0..2], &[0xFF, 0xD8], "not a JPEG");

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&8u32.to_le_bytes());
    // IFD0 with a single SHORT entry
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x0112u16.to_le_bytes());
    tiff.extend_from_slice(&3u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&orientation.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_le_bytes());

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);

    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&jpeg[0..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Baseline JPEG of a flat mid-grey, built by hand.
///
/// Every block has a zero DC difference and an immediate EOB, and both
/// Huffman tables hold a single one-bit code, so the scan is six zero bits
/// per MCU. Large sources stay cheap to build and the decoded pixels are all
/// `(128, 128, 128)`.
pub fn solid_grey_jpeg(width: u16, height: u16) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];

    // DQT: table 0, all ones
    out.extend_from_slice(&[0xFF, 0xDB, 0x00, 67, 0x00]);
    out.extend_from_slice(&[1u8; 64]);

    // SOF0: 8-bit, three components, no subsampling
    out.extend_from_slice(&[0xFF, 0xC0, 0x00, 17, 8]);
    out.extend_from_slice(&height.to_be_bytes());
    out.extend_from_slice(&width.to_be_bytes());
    out.push(3);
    for id in 1..=3u8 {
        out.extend_from_slice(&[id, 0x11, 0x00]);
    }

    // DHT: DC 0 and AC 0, each mapping code "0" to symbol 0
    for class in [0x00u8, 0x10] {
        out.extend_from_slice(&[0xFF, 0xC4, 0x00, 20, class, 1]);
        out.extend_from_slice(&[0u8; 15]);
        out.push(0x00);
    }

    // SOS
    out.extend_from_slice(&[0xFF, 0xDA, 0x00, 12, 3]);
    for id in 1..=3u8 {
        out.extend_from_slice(&[id, 0x00]);
    }
    out.extend_from_slice(&[0, 63, 0]);

    let mcus = (width as u64).div_ceil(8) * (height as u64).div_ceil(8);
    let bits = mcus * 6;
    out.resize(out.len() + (bits / 8) as usize, 0x00);
    let rest = (bits % 8) as u32;
    if rest != 0 {
        // Pad the final byte with one bits
        out.push(((1u32 << (8 - rest)) - 1) as u8);
    }

    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

/// Payloads of every DQT segment ahead of the first scan.
pub fn quantization_tables(jpeg: &[u8]) -> Vec<Vec<u8>> {
    let mut tables = Vec::new();
    let mut pos = 2;
    while pos + 4 <= jpeg.len() {
        assert_eq!(jpeg[pos], 0xFF, "marker expected at {}", pos);
        let marker = jpeg[pos + 1];
        if marker == 0xDA {
            break;
        }
        let len = u16::from_be_bytes([jpeg[pos + 2], jpeg[pos + 3]]) as usize;
        if marker == 0xDB {
            tables.push(jpeg[pos + 4..pos + 2 + len].to_vec());
        }
        pos += 2 + len;
    }
    tables
}
