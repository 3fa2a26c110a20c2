//! Run-level outcome taxonomy.

use thiserror::Error;

use crate::decode::DecodeError;
use crate::normalize::NormalizeError;

/// Why a run ended without a picked image.
///
/// The first three variants are cancellations: the run ends quietly and the
/// listener isn't told. The rest are failures, reported through
/// [`PickListener::on_pick_failed`](crate::acquire::PickListener::on_pick_failed).
#[derive(Debug, Error)]
pub enum PickError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("source selection cancelled")]
    SourceSelectionCancelled,

    #[error("no camera app available")]
    NoCameraApp,

    #[error("could not decode source: {0}")]
    DecodeFailed(DecodeError),

    #[error("could not normalize source: {0}")]
    NormalizeFailed(NormalizeError),

    #[error("crop failed with result code {code}")]
    CropFailed { code: i32 },

    #[error("output unavailable: {0}")]
    OutputUnavailable(String),
}

impl PickError {
    /// True for outcomes the user chose, as opposed to errors.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied | Self::SourceSelectionCancelled | Self::NoCameraApp
        )
    }
}

impl From<DecodeError> for PickError {
    fn from(err: DecodeError) -> Self {
        Self::DecodeFailed(err)
    }
}

impl From<NormalizeError> for PickError {
    fn from(err: NormalizeError) -> Self {
        match err {
            NormalizeError::Decode(e) => Self::DecodeFailed(e),
            other => Self::NormalizeFailed(other),
        }
    }
}
