//! Run identity and the states a run passes through.
//!
//! A [`Run`] pairs its [`RunId`] with the request snapshot it started from,
//! so a crop setting changed mid-run doesn't affect it.

use std::fmt;
use std::path::PathBuf;

use super::request::{AcquisitionRequest, RequestCode, SourceRef};
use crate::error::PickError;

/// Identifies one run of a picker. Increases with every new run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// The operation that started a run, resumed after a permission grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Chooser { include_camera: bool },
    Camera,
}

impl Entry {
    /// Code used for this entry's permission request.
    pub fn permission_code(self) -> RequestCode {
        match self {
            Entry::Chooser {
                include_camera: true,
            } => RequestCode::ChooserWithCamera,
            Entry::Chooser {
                include_camera: false,
            } => RequestCode::ChooserWithoutCamera,
            Entry::Camera => RequestCode::CameraCapture,
        }
    }
}

#[derive(Debug)]
pub enum RunState {
    Idle,
    AwaitingPermission {
        entry: Entry,
    },
    AwaitingSourceSelection {
        /// Capture target handed to the camera, if one was offered.
        camera_capture: Option<PathBuf>,
    },
    AwaitingCrop {
        source: SourceRef,
    },
    Normalizing {
        source: SourceRef,
    },
    Done {
        location: PathBuf,
    },
    Cancelled {
        reason: PickError,
    },
    Failed {
        error: PickError,
    },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Done { .. } | RunState::Cancelled { .. } | RunState::Failed { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::AwaitingPermission { .. } => "awaiting_permission",
            RunState::AwaitingSourceSelection { .. } => "awaiting_source_selection",
            RunState::AwaitingCrop { .. } => "awaiting_crop",
            RunState::Normalizing { .. } => "normalizing",
            RunState::Done { .. } => "done",
            RunState::Cancelled { .. } => "cancelled",
            RunState::Failed { .. } => "failed",
        }
    }
}

/// One acquisition from trigger to terminal state.
#[derive(Debug)]
pub struct Run {
    pub id: RunId,
    pub request: AcquisitionRequest,
    pub state: RunState,
}

impl Run {
    pub fn new(id: RunId, request: AcquisitionRequest) -> Self {
        Self {
            id,
            request,
            state: RunState::Idle,
        }
    }
}
