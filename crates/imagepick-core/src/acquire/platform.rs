//! Seams to the host platform and the host application.

use std::fs;
use std::io;
use std::path::Path;

use super::request::{
    AspectRatio, Chooser, Intent, IntentAction, Permission, PermissionState, RequestCode,
    SourceRef,
};
use crate::error::PickError;

/// Platform services the picker drives but doesn't implement.
///
/// Every `launch_*` and `request_*` call is fire-and-forget: the answer comes
/// back later through [`ImagePicker::deliver_permission_result`] or
/// [`ImagePicker::deliver_activity_result`] with the same request code.
///
/// [`ImagePicker::deliver_permission_result`]: super::ImagePicker::deliver_permission_result
/// [`ImagePicker::deliver_activity_result`]: super::ImagePicker::deliver_activity_result
pub trait Platform {
    fn permission_state(&self, permission: Permission) -> PermissionState;

    fn request_permissions(&mut self, permissions: &[Permission], code: RequestCode);

    /// Whether any app can handle an image capture.
    fn can_capture(&self) -> bool;

    /// Resolvable gallery/document intents for `action`, one per handler.
    fn gallery_intents(&self, action: IntentAction) -> Vec<Intent>;

    fn launch_chooser(&mut self, chooser: Chooser, code: RequestCode);

    fn launch_camera(&mut self, intent: Intent, code: RequestCode);

    /// Start the crop UI; its result arrives with [`RequestCode::Crop`].
    fn launch_crop(&mut self, source: &SourceRef, aspect: AspectRatio);

    /// Read the encoded bytes behind `source`.
    ///
    /// Plain files are read directly; content locators need the platform.
    fn read_source(&self, source: &SourceRef) -> io::Result<Vec<u8>> {
        match source {
            SourceRef::File(path) => fs::read(path),
            SourceRef::Content(uri) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("cannot resolve {}", uri),
            )),
        }
    }

    /// Tell the user the pick was cancelled for lack of permission.
    fn show_cancel_notice(&mut self) {}
}

/// Receives the terminal outcome of each run.
pub trait PickListener {
    /// Called once per successful run.
    fn on_image_picked(&mut self, location: &Path);

    /// Called once per failed run. Cancellations are not reported.
    fn on_pick_failed(&mut self, _error: &PickError) {}
}
