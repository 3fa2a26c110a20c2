//! The acquisition state machine.
//!
//! A run moves through these states:
//!
//! ```text
//! Idle -> AwaitingPermission -> AwaitingSourceSelection -> AwaitingCrop -> Done
//!                                      |                                  ^
//!                                      +-----------> Normalizing ---------+
//! ```
//!
//! Any waiting state can end in `Cancelled` or `Failed` instead. The host
//! drives the machine by forwarding its platform callbacks
//! ([`ImagePicker::deliver_permission_result`],
//! [`ImagePicker::deliver_activity_result`]) and, with background execution,
//! by calling [`ImagePicker::dispatch_completions`] on its own thread.
//!
//! Starting a run while another is unfinished abandons the old one. Late
//! results addressed to it are dropped.

mod picker;
mod platform;
mod request;
mod state;
mod worker;


pub use picker::ImagePicker;
pub use platform::{PickListener, Platform};
pub use request::{
    AcquisitionRequest, ActivityPayload, AspectRatio, Chooser, Intent, IntentAction, Permission,
    PermissionState, RequestCode, ResultCode, SourceRef,
};
pub use state::{Entry, RunId, RunState};
pub use worker::{Completion, Job, NormalizeWorker};
