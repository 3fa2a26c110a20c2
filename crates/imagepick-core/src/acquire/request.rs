//! Values exchanged with the host platform.
//!
//! Request and result codes keep their numeric form so a host can route
//! its raw callbacks straight into the picker.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Crop aspect ratio, e.g. 1:1 or 4:3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// What a run was asked to do. Fixed for the lifetime of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionRequest {
    pub wants_camera: bool,
    pub crop: Option<AspectRatio>,
}

impl AcquisitionRequest {
    /// Permissions that must all be granted before any source is shown.
    pub fn required_permissions(&self) -> &'static [Permission] {
        if self.crop.is_some() {
            &[Permission::Camera, Permission::ReadExternalStorage]
        } else {
            &[Permission::Camera]
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Camera,
    ReadExternalStorage,
}

impl Permission {
    /// Platform identifier for the permission.
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Camera => "android.permission.CAMERA",
            Permission::ReadExternalStorage => "android.permission.READ_EXTERNAL_STORAGE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    #[default]
    Unknown,
    Granted,
    Denied,
}

/// Raw grant result: 0 is granted, anything else is denied.
impl From<i32> for PermissionState {
    fn from(value: i32) -> Self {
        if value == 0 {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        }
    }
}

/// Correlates an outbound request with its inbound result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestCode {
    /// Permission request on the way to a chooser with a camera entry.
    ChooserWithCamera,
    /// Permission request on the way to a gallery-only chooser.
    ChooserWithoutCamera,
    /// Permission request on the way to a direct camera launch.
    CameraCapture,
    /// The source chooser, or the camera launched directly.
    Chooser,
    Crop,
    Other(i32),
}

impl RequestCode {
    pub fn code(self) -> i32 {
        match self {
            RequestCode::ChooserWithCamera => 100,
            RequestCode::ChooserWithoutCamera => 101,
            RequestCode::Chooser => 200,
            RequestCode::Crop => 203,
            RequestCode::CameraCapture => 2011,
            RequestCode::Other(code) => code,
        }
    }
}

impl From<i32> for RequestCode {
    fn from(code: i32) -> Self {
        match code {
            100 => RequestCode::ChooserWithCamera,
            101 => RequestCode::ChooserWithoutCamera,
            200 => RequestCode::Chooser,
            203 => RequestCode::Crop,
            2011 => RequestCode::CameraCapture,
            other => RequestCode::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Ok,
    Canceled,
    /// The crop activity reported an error.
    CropError,
    Other(i32),
}

impl ResultCode {
    pub fn code(self) -> i32 {
        match self {
            ResultCode::Ok => -1,
            ResultCode::Canceled => 0,
            ResultCode::CropError => 204,
            ResultCode::Other(code) => code,
        }
    }
}

impl From<i32> for ResultCode {
    fn from(code: i32) -> Self {
        match code {
            -1 => ResultCode::Ok,
            0 => ResultCode::Canceled,
            204 => ResultCode::CropError,
            other => ResultCode::Other(other),
        }
    }
}

/// Opaque locator for a source or result image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceRef {
    File(PathBuf),
    /// Anything the platform resolves itself, e.g. `content://...`.
    Content(String),
}

impl SourceRef {
    /// Parse a URI-like string; `file://` URIs become plain files.
    pub fn parse(uri: &str) -> Self {
        match uri.strip_prefix("file://") {
            Some(path) => SourceRef::File(PathBuf::from(path)),
            None => SourceRef::Content(uri.to_string()),
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            SourceRef::File(path) => Some(path),
            SourceRef::Content(_) => None,
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRef::File(path) => write!(f, "file://{}", path.display()),
            SourceRef::Content(uri) => f.write_str(uri),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentAction {
    ImageCapture,
    GetContent,
    Pick,
}

/// A launchable source activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub action: IntentAction,
    /// Handling package, when resolved to a specific app.
    pub package: Option<String>,
    /// Where a capture should write its output.
    pub output: Option<SourceRef>,
}

impl Intent {
    pub fn camera_capture(output: SourceRef) -> Self {
        Self {
            action: IntentAction::ImageCapture,
            package: None,
            output: Some(output),
        }
    }

    pub fn gallery(action: IntentAction, package: impl Into<String>) -> Self {
        Self {
            action,
            package: Some(package.into()),
            output: None,
        }
    }
}

/// A source chooser: one target intent plus extra initial entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chooser {
    pub title: String,
    /// `None` when nothing could be offered.
    pub target: Option<Intent>,
    pub initial: Vec<Intent>,
}

impl Chooser {
    /// The last intent becomes the target, the rest initial entries.
    pub fn from_intents(title: impl Into<String>, mut intents: Vec<Intent>) -> Self {
        let target = intents.pop();
        Self {
            title: title.into(),
            target,
            initial: intents,
        }
    }

    /// Every entry, initial ones first.
    pub fn intents(&self) -> impl Iterator<Item = &Intent> {
        self.initial.iter().chain(self.target.iter())
    }
}

/// Data returned by a finished activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityPayload {
    pub action: Option<IntentAction>,
    pub data: Option<SourceRef>,
}

impl ActivityPayload {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_data(data: SourceRef) -> Self {
        Self {
            action: None,
            data: Some(data),
        }
    }

    /// Camera results come back without data, or tagged as a capture.
    pub fn is_camera_result(&self) -> bool {
        self.data.is_none() || self.action == Some(IntentAction::ImageCapture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_permissions() {
        let plain = AcquisitionRequest {
            wants_camera: true,
            crop: None,
        };
        assert_eq!(plain.required_permissions(), &[Permission::Camera]);

        let cropping = AcquisitionRequest {
            wants_camera: false,
            crop: Some(AspectRatio::new(1, 1)),
        };
        assert_eq!(
            cropping.required_permissions(),
            &[Permission::Camera, Permission::ReadExternalStorage]
        );
    }

    #[test]
    fn test_request_codes() {
        for code in [100, 101, 200, 203, 2011] {
            assert_eq!(RequestCode::from(code).code(), code);
        }
        assert_eq!(RequestCode::from(200), RequestCode::Chooser);
        assert_eq!(RequestCode::from(7), RequestCode::Other(7));
    }

    #[test]
    fn test_result_codes() {
        assert_eq!(ResultCode::from(-1), ResultCode::Ok);
        assert_eq!(ResultCode::from(0), ResultCode::Canceled);
        assert_eq!(ResultCode::from(204), ResultCode::CropError);
        assert_eq!(ResultCode::from(1).code(), 1);
    }

    #[test]
    fn test_grant_values() {
        assert_eq!(PermissionState::from(0), PermissionState::Granted);
        assert_eq!(PermissionState::from(-1), PermissionState::Denied);
    }

    #[test]
    fn test_source_ref_parse() {
        assert_eq!(
            SourceRef::parse("file:///data/crop/out.jpg"),
            SourceRef::File(PathBuf::from("/data/crop/out.jpg"))
        );
        let content = SourceRef::parse("content://media/external/images/7");
        assert_eq!(content.as_path(), None);
        assert_eq!(content.to_string(), "content://media/external/images/7");
    }

    #[test]
    fn test_chooser_last_intent_is_target() {
        let camera = Intent::camera_capture(SourceRef::File(PathBuf::from("/c.jpg")));
        let gallery = Intent::gallery(IntentAction::GetContent, "com.gallery");
        let chooser = Chooser::from_intents("Select source", vec![camera.clone(), gallery.clone()]);

        assert_eq!(chooser.target, Some(gallery));
        assert_eq!(chooser.initial, vec![camera]);
        assert_eq!(chooser.intents().count(), 2);
    }

    #[test]
    fn test_chooser_without_intents() {
        let chooser = Chooser::from_intents("Select source", Vec::new());
        assert!(chooser.target.is_none());
        assert!(chooser.initial.is_empty());
    }

    #[test]
    fn test_camera_result_detection() {
        assert!(ActivityPayload::empty().is_camera_result());

        let picked = ActivityPayload::with_data(SourceRef::parse("content://x/1"));
        assert!(!picked.is_camera_result());

        let tagged = ActivityPayload {
            action: Some(IntentAction::ImageCapture),
            data: Some(SourceRef::parse("content://x/1")),
        };
        assert!(tagged.is_camera_result());
    }
}
