//! Transient file lifecycle.
//!
//! Every intermediate artifact of a run (camera capture target, stored copy,
//! compressed output) gets a fresh, kind-specific name from
//! [`StorageHousekeeper::allocate`]. After a step completes, [`prune`]
//! removes everything else in that artifact's directory so storage doesn't
//! grow across runs.
//!
//! | Kind | Name | Created on allocate |
//! |---|---|---|
//! | Camera capture | `outputImage<unix-millis>.jpg` | yes, empty |
//! | Stored copy | `MI_<ddMMyyyy_HHmm>.jpg` | no |
//! | Compressed | `JPEG_<yyyyMMdd_HHmm>_<random>.jpg` | yes, atomically |

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Kinds of transient artifact the pipeline writes itself.
///
/// Crop outputs are produced by the external crop subsystem and only pruned
/// here, never allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransientKind {
    CameraCapture,
    Stored,
    Compressed,
}

/// Directories holding each kind of transient artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageLayout {
    pub capture_dir: PathBuf,
    pub stored_dir: PathBuf,
    pub compressed_dir: PathBuf,
}

impl StorageLayout {
    /// Standard layout below `base`: `images/`, `Files/` and `Pictures/`.
    pub fn under(base: &Path) -> Self {
        Self {
            capture_dir: base.join("images"),
            stored_dir: base.join("Files"),
            compressed_dir: base.join("Pictures"),
        }
    }

    pub fn dir_for(&self, kind: TransientKind) -> &Path {
        match kind {
            TransientKind::CameraCapture => &self.capture_dir,
            TransientKind::Stored => &self.stored_dir,
            TransientKind::Compressed => &self.compressed_dir,
        }
    }

    /// True when every kind has its own directory.
    ///
    /// Pruning one kind would otherwise delete another kind's artifacts.
    pub fn is_disjoint(&self) -> bool {
        self.capture_dir != self.stored_dir
            && self.capture_dir != self.compressed_dir
            && self.stored_dir != self.compressed_dir
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self::under(&std::env::temp_dir().join("imagepick"))
    }
}

/// Allocates transient file names and prunes stale ones.
#[derive(Debug, Clone)]
pub struct StorageHousekeeper {
    layout: StorageLayout,
}

impl StorageHousekeeper {
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Allocate a fresh path for `kind`, creating its directory if needed.
    pub fn allocate(&self, kind: TransientKind) -> io::Result<PathBuf> {
        self.allocate_at(kind, Local::now())
    }

    pub fn allocate_at(&self, kind: TransientKind, now: DateTime<Local>) -> io::Result<PathBuf> {
        let dir = self.layout.dir_for(kind);
        fs::create_dir_all(dir)?;

        let path = match kind {
            TransientKind::CameraCapture => {
                let path = dir.join(format!("outputImage{}.jpg", now.timestamp_millis()));
                fs::File::create(&path)?;
                path
            }
            TransientKind::Stored => dir.join(format!("MI_{}.jpg", now.format("%d%m%Y_%H%M"))),
            TransientKind::Compressed => {
                let prefix = format!("JPEG_{}_", now.format("%Y%m%d_%H%M"));
                let file = tempfile::Builder::new()
                    .prefix(&prefix)
                    .suffix(".jpg")
                    .tempfile_in(dir)?;
                let (_, path) = file.keep().map_err(|e| e.error)?;
                path
            }
        };

        debug!(?kind, path = %path.display(), "allocated transient file");
        Ok(path)
    }

    /// Prune the directory of `kind`, keeping only `keep`'s file name.
    pub fn prune_kind(&self, kind: TransientKind, keep: &Path) -> usize {
        match keep.file_name().and_then(|n| n.to_str()) {
            Some(name) => prune(self.layout.dir_for(kind), name),
            None => 0,
        }
    }
}

/// Delete every entry of `dir` whose name differs from `keep_name`.
///
/// Best-effort: a missing directory or an entry that can't be removed is
/// skipped. Returns the number of entries removed.
pub fn prune(dir: &Path, keep_name: &str) -> usize {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "nothing to prune");
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        if entry.file_name() == keep_name {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => debug!(path = %entry.path().display(), error = %e, "prune skipped entry"),
        }
    }

    debug!(dir = %dir.display(), keep = keep_name, removed, "pruned");
    removed
}


// ============================================================================
// Property-Based Tests
// ============================================================================
