//! Imagepick Core - single-image acquisition and normalization
//!
//! This crate drives the "pick an image" workflow for a host application:
//! permission checks, camera or gallery selection, optional cropping, and a
//! bounded-memory pipeline that turns an arbitrarily large source into a
//! small, upright JPEG on disk.
//!
//! - [`acquire`]: the run state machine and its platform seams
//! - [`decode`]: header probing, sampled decoding, EXIF orientation
//! - [`normalize`]: fit, scale, rotate and compress
//! - [`encode`]: JPEG and PNG output
//! - [`storage`]: transient file naming and pruning
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod acquire;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod normalize;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;

pub use acquire::{
    ActivityPayload, ImagePicker, PermissionState, PickListener, Platform, RequestCode,
    ResultCode, RunId, RunState, SourceRef,
};
pub use config::{ConfigError, Execution, PickerConfig};
pub use error::PickError;
pub use normalize::{target_dimensions, BoundBox, NormalizedImage, Normalizer, WriteMode};
pub use storage::{StorageHousekeeper, StorageLayout, TransientKind};
