//! Bounded resize, orientation correction and JPEG compression.
//!
//! [`Normalizer::normalize`] turns an arbitrarily large source into a small,
//! upright JPEG on disk:
//!
//! 1. Probe the header and fit the source into the [`BoundBox`]
//!    (612x816 by default), preserving aspect ratio.
//! 2. Decode with an integer sample size, then render onto a canvas of exactly
//!    the target size.
//! 3. Rotate by the source's EXIF orientation.
//! 4. Encode JPEG (quality 80) into a freshly allocated output file.
//!
//! With [`WriteMode::StoreThenCompress`] steps 1-2 first produce a lossless
//! copy of the fitted source, and steps 3-4 run on that copy. This reproduces the file
//! set earlier versions of the picker left on disk. [`WriteMode::SingleStage`]
//! skips the intermediate copy.

mod canvas;

pub use canvas::{allocate_canvas, render_scaled};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::decode::{
    apply_rotation, decode_bounded, probe, rotation_for, DecodeBudget, DecodeError, DecodedImage,
    Dimensions, Rotation,
};
use crate::encode::{encode_image_jpeg, encode_image_png, EncodeError};
use crate::storage::{StorageHousekeeper, TransientKind};

/// Errors that abort a normalization.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("could not allocate a {width}x{height} canvas")]
    CanvasAllocation { width: u32, height: u32 },

    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Maximum width and height of a normalized image, before rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundBox {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for BoundBox {
    fn default() -> Self {
        Self {
            max_width: 612,
            max_height: 816,
        }
    }
}

/// How the normalizer writes its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Store a lossless copy of the decoded source, then compress that copy.
    #[default]
    StoreThenCompress,
    /// Compress straight from the source bytes.
    SingleStage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub bound: BoundBox,
    pub jpeg_quality: u8,
    pub budget: DecodeBudget,
    pub write_mode: WriteMode,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            bound: BoundBox::default(),
            jpeg_quality: 80,
            budget: DecodeBudget::default(),
            write_mode: WriteMode::default(),
        }
    }
}

/// A normalized image on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    /// The compressed JPEG.
    pub path: PathBuf,
    /// Final width, after rotation.
    pub width: u32,
    /// Final height, after rotation.
    pub height: u32,
    pub rotation: Rotation,
    /// Lossless intermediate, when written.
    pub stored: Option<PathBuf>,
}

/// Fit `source` into `bound` preserving aspect ratio.
///
/// Sources that already fit are kept as-is. Otherwise the more constrained
/// axis is pinned to the box and the other is scaled and truncated; a source
/// with exactly the box's aspect ratio gets the box itself.
pub fn target_dimensions(source: Dimensions, bound: BoundBox) -> Dimensions {
    if source.width <= bound.max_width && source.height <= bound.max_height {
        return source;
    }

    let (w, h) = (source.width as u64, source.height as u64);
    let (max_w, max_h) = (bound.max_width as u64, bound.max_height as u64);

    // Compare w/h against max_w/max_h without floating point
    let (width, height) = match (w * max_h).cmp(&(max_w * h)) {
        std::cmp::Ordering::Less => ((w * max_h / h) as u32, bound.max_height),
        std::cmp::Ordering::Greater => (bound.max_width, (h * max_w / w) as u32),
        std::cmp::Ordering::Equal => (bound.max_width, bound.max_height),
    };

    Dimensions::new(width.max(1), height.max(1))
}

/// Runs the normalization pipeline against a storage layout.
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizeConfig,
    storage: StorageHousekeeper,
}

impl Normalizer {
    pub fn new(config: NormalizeConfig, storage: StorageHousekeeper) -> Self {
        Self { config, storage }
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    /// Normalize encoded `source` bytes into a new JPEG file.
    ///
    /// Earlier outputs are left in place; see [`Normalizer::prune_except`].
    pub fn normalize(&self, source: &[u8]) -> Result<NormalizedImage, NormalizeError> {
        // Orientation always comes from the original; the stored copy has no EXIF
        let rotation = rotation_for(source);

        let result = match self.config.write_mode {
            WriteMode::SingleStage => self.compress(source, rotation, None)?,
            WriteMode::StoreThenCompress => {
                let stored = self.store(source)?;
                let bytes = fs::read(&stored)?;
                self.compress(&bytes, rotation, Some(stored))?
            }
        };

        info!(
            path = %result.path.display(),
            width = result.width,
            height = result.height,
            rotation = result.rotation.degrees(),
            "normalized image"
        );
        Ok(result)
    }

    /// Read and normalize a file.
    pub fn normalize_file(&self, source: &Path) -> Result<NormalizedImage, NormalizeError> {
        let bytes = fs::read(source)?;
        self.normalize(&bytes)
    }

    /// Remove every earlier compressed and stored output except `image`'s.
    pub fn prune_except(&self, image: &NormalizedImage) {
        self.storage.prune_kind(TransientKind::Compressed, &image.path);
        if let Some(stored) = &image.stored {
            self.storage.prune_kind(TransientKind::Stored, stored);
        }
    }

    /// Delete the compressed output of a result nobody will use.
    ///
    /// The stored copy is left for the next prune, since stored names are
    /// per-minute and may belong to a newer run.
    pub fn discard(&self, image: &NormalizedImage) {
        if let Err(e) = fs::remove_file(&image.path) {
            debug!(path = %image.path.display(), error = %e, "could not discard output");
        }
    }

    /// Write a lossless copy of the source, already fitted to the bound box.
    fn store(&self, source: &[u8]) -> Result<PathBuf, NormalizeError> {
        let fitted = self.fit(source)?;
        let png = encode_image_png(&fitted)?;

        let path = self.storage.allocate(TransientKind::Stored)?;
        fs::write(&path, png)?;
        debug!(path = %path.display(), "stored decoded source");
        Ok(path)
    }

    fn compress(
        &self,
        bytes: &[u8],
        rotation: Rotation,
        stored: Option<PathBuf>,
    ) -> Result<NormalizedImage, NormalizeError> {
        let fitted = self.fit(bytes)?;
        let upright = apply_rotation(fitted, rotation);
        let jpeg = encode_image_jpeg(&upright, self.config.jpeg_quality)?;

        let path = self.storage.allocate(TransientKind::Compressed)?;
        fs::write(&path, jpeg)?;

        Ok(NormalizedImage {
            path,
            width: upright.width,
            height: upright.height,
            rotation,
            stored,
        })
    }

    /// Decode `bytes` onto a canvas of exactly the fitted target size.
    fn fit(&self, bytes: &[u8]) -> Result<DecodedImage, NormalizeError> {
        let probed = probe(bytes)?;
        let target = target_dimensions(probed, self.config.bound);
        debug!(
            probed_width = probed.width,
            probed_height = probed.height,
            target_width = target.width,
            target_height = target.height,
            "fitting into bound box"
        );

        let sampled = decode_bounded(bytes, target.width, target.height, &self.config.budget)?;
        render_scaled(&sampled.image, target.width, target.height)
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
