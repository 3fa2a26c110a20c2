//! [`ImagePicker`], the host-facing driver of a pick run.
//!
//! Public methods start runs or feed platform callbacks into the current one.
//! Each callback is checked against the run's state and request code, and
//! anything that doesn't match is logged and ignored. Finished normalizations
//! are the only point where older outputs are pruned, so a result that lost
//! its run never removes the image a newer run delivered.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::platform::{PickListener, Platform};
use super::request::{
    AcquisitionRequest, ActivityPayload, AspectRatio, Chooser, Intent, IntentAction,
    PermissionState, RequestCode, ResultCode, SourceRef,
};
use super::state::{Entry, Run, RunId, RunState};
use super::worker::{Completion, Job, NormalizeWorker};
use crate::config::{ConfigError, Execution, PickerConfig};
use crate::decode::DecodeError;
use crate::error::PickError;
use crate::normalize::{NormalizeError, Normalizer};
use crate::storage::{self, StorageHousekeeper, TransientKind};

/// Coordinates permission, source selection, crop and normalization for one
/// image at a time.
pub struct ImagePicker<P: Platform, L: PickListener> {
    platform: P,
    listener: L,
    config: PickerConfig,
    storage: StorageHousekeeper,
    normalizer: Normalizer,
    worker: Option<NormalizeWorker>,
    crop: Option<AspectRatio>,
    run: Option<Run>,
    next_run: u64,
    latest: Option<PathBuf>,
}

impl<P: Platform, L: PickListener> ImagePicker<P, L> {
    pub fn new(platform: P, listener: L, config: PickerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let storage = StorageHousekeeper::new(config.storage.clone());
        let normalizer = Normalizer::new(config.normalize.clone(), storage.clone());
        let worker = match config.execution {
            Execution::Inline => None,
            Execution::Background => Some(
                NormalizeWorker::spawn(normalizer.clone()).map_err(ConfigError::Worker)?,
            ),
        };

        Ok(Self {
            platform,
            listener,
            config,
            storage,
            normalizer,
            worker,
            crop: None,
            run: None,
            next_run: 1,
            latest: None,
        })
    }

    /// Enable cropping to `aspect_width:aspect_height` for later runs.
    pub fn configure_crop(&mut self, aspect_width: u32, aspect_height: u32) -> &mut Self {
        self.crop = Some(AspectRatio::new(aspect_width, aspect_height));
        self
    }

    /// Start a run that offers gallery sources, plus the camera if asked.
    pub fn choose(&mut self, include_camera: bool) -> RunId {
        let id = self.begin_run(include_camera);
        self.enter(Entry::Chooser { include_camera });
        id
    }

    /// Start a run that goes straight to the camera.
    pub fn open_camera(&mut self) -> RunId {
        let id = self.begin_run(true);
        self.enter(Entry::Camera);
        id
    }

    pub fn deliver_permission_result(&mut self, code: RequestCode, grants: &[PermissionState]) {
        let entry = match self.current_state() {
            Some(RunState::AwaitingPermission { entry }) if entry.permission_code() == code => {
                *entry
            }
            other => {
                debug!(
                    code = code.code(),
                    state = other.map(RunState::name),
                    "ignoring permission result"
                );
                return;
            }
        };

        let granted = !grants.is_empty() && grants.iter().all(|g| *g == PermissionState::Granted);
        if granted {
            debug!(?entry, "permissions granted");
            self.proceed(entry);
        } else {
            self.platform.show_cancel_notice();
            self.cancel(PickError::PermissionDenied);
        }
    }

    pub fn deliver_activity_result(
        &mut self,
        result: ResultCode,
        code: RequestCode,
        payload: ActivityPayload,
    ) {
        match (self.current_state(), code) {
            // ===== Source selection =====
            (Some(RunState::AwaitingSourceSelection { .. }), RequestCode::Chooser) => {
                if result == ResultCode::Ok {
                    self.handle_picked(payload);
                } else {
                    self.cancel(PickError::SourceSelectionCancelled);
                }
            }

            // ===== Crop =====
            (Some(RunState::AwaitingCrop { .. }), RequestCode::Crop) => match result {
                ResultCode::Ok => self.handle_cropped(payload),
                ResultCode::CropError => self.fail(PickError::CropFailed {
                    code: result.code(),
                }),
                _ => self.cancel(PickError::SourceSelectionCancelled),
            },

            (state, code) => {
                warn!(
                    code = code.code(),
                    result = result.code(),
                    state = state.map(RunState::name),
                    "ignoring activity result"
                );
            }
        }
    }

    /// Deliver any finished background normalizations. Returns how many
    /// completions were taken off the queue.
    pub fn dispatch_completions(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(completion) = self.worker.as_ref().and_then(NormalizeWorker::try_next) {
            self.complete(completion);
            delivered += 1;
        }
        delivered
    }

    /// Like [`dispatch_completions`](Self::dispatch_completions), but waits
    /// up to `timeout` for the first completion.
    pub fn wait_for_completions(&mut self, timeout: Duration) -> usize {
        let first = self.worker.as_ref().and_then(|w| w.wait_next(timeout));
        match first {
            Some(completion) => {
                self.complete(completion);
                1 + self.dispatch_completions()
            }
            None => 0,
        }
    }

    /// Location of the most recent successful run.
    pub fn latest_image(&self) -> Option<&Path> {
        self.latest.as_deref()
    }

    pub fn state(&self) -> Option<&RunState> {
        self.current_state()
    }

    pub fn run_id(&self) -> Option<RunId> {
        self.run.as_ref().map(|run| run.id)
    }

    pub fn config(&self) -> &PickerConfig {
        &self.config
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    fn current_state(&self) -> Option<&RunState> {
        self.run.as_ref().map(|run| &run.state)
    }

    fn set_state(&mut self, state: RunState) {
        if let Some(run) = self.run.as_mut() {
            debug!(run = %run.id, from = run.state.name(), to = state.name(), "transition");
            run.state = state;
        }
    }

    fn begin_run(&mut self, wants_camera: bool) -> RunId {
        if let Some(old) = self.run.as_ref().filter(|run| !run.state.is_terminal()) {
            info!(run = %old.id, state = old.state.name(), "abandoning unfinished run");
        }

        let id = RunId(self.next_run);
        self.next_run += 1;
        let request = AcquisitionRequest {
            wants_camera,
            crop: self.crop,
        };
        self.run = Some(Run::new(id, request));
        debug!(run = %id, wants_camera, crop = ?request.crop, "run started");
        id
    }

    fn request(&self) -> Option<AcquisitionRequest> {
        self.run.as_ref().map(|run| run.request)
    }

    // ===== Permission =====

    fn enter(&mut self, entry: Entry) {
        let Some(request) = self.request() else {
            return;
        };

        let required = request.required_permissions();
        let missing = required
            .iter()
            .any(|p| self.platform.permission_state(*p) != PermissionState::Granted);

        if missing {
            self.platform
                .request_permissions(required, entry.permission_code());
            self.set_state(RunState::AwaitingPermission { entry });
        } else {
            self.proceed(entry);
        }
    }

    fn proceed(&mut self, entry: Entry) {
        match entry {
            Entry::Chooser { include_camera } => self.present_chooser(include_camera),
            Entry::Camera => self.launch_camera(),
        }
    }

    // ===== Source selection =====

    fn present_chooser(&mut self, include_camera: bool) {
        let mut intents = Vec::new();
        let mut camera_capture = None;

        if include_camera {
            match self.storage.allocate(TransientKind::CameraCapture) {
                Ok(path) => {
                    intents.push(Intent::camera_capture(SourceRef::File(path.clone())));
                    camera_capture = Some(path);
                }
                Err(e) => warn!(error = %e, "no capture file, offering gallery only"),
            }
        }

        let mut gallery = self.platform.gallery_intents(IntentAction::GetContent);
        if gallery.is_empty() {
            gallery = self.platform.gallery_intents(IntentAction::Pick);
        }
        intents.extend(gallery);

        let chooser = Chooser::from_intents(self.config.chooser_title.clone(), intents);
        self.platform.launch_chooser(chooser, RequestCode::Chooser);
        self.set_state(RunState::AwaitingSourceSelection { camera_capture });
    }

    fn launch_camera(&mut self) {
        if !self.platform.can_capture() {
            self.cancel(PickError::NoCameraApp);
            return;
        }

        let path = match self.storage.allocate(TransientKind::CameraCapture) {
            Ok(path) => path,
            Err(e) => {
                self.fail(PickError::OutputUnavailable(format!(
                    "cannot create capture file: {}",
                    e
                )));
                return;
            }
        };

        let intent = Intent::camera_capture(SourceRef::File(path.clone()));
        self.platform.launch_camera(intent, RequestCode::Chooser);
        self.set_state(RunState::AwaitingSourceSelection {
            camera_capture: Some(path),
        });
    }

    fn handle_picked(&mut self, payload: ActivityPayload) {
        let camera_capture = match self.current_state() {
            Some(RunState::AwaitingSourceSelection { camera_capture }) => camera_capture.clone(),
            _ => None,
        };

        let source = if payload.is_camera_result() {
            let Some(path) = camera_capture else {
                self.fail(PickError::OutputUnavailable(
                    "camera result without a capture file".to_string(),
                ));
                return;
            };
            self.storage.prune_kind(TransientKind::CameraCapture, &path);
            SourceRef::File(path)
        } else {
            match payload.data {
                Some(data) => data,
                None => return,
            }
        };
        debug!(%source, "source selected");

        match self.request().and_then(|r| r.crop) {
            Some(aspect) => {
                self.platform.launch_crop(&source, aspect);
                self.set_state(RunState::AwaitingCrop { source });
            }
            None => self.start_normalizing(source),
        }
    }

    // ===== Crop =====

    fn handle_cropped(&mut self, payload: ActivityPayload) {
        let Some(path) = payload.data.as_ref().and_then(SourceRef::as_path) else {
            self.fail(PickError::OutputUnavailable(
                "crop returned no file".to_string(),
            ));
            return;
        };
        if !path.is_file() {
            let msg = format!("crop output {} is missing", path.display());
            self.fail(PickError::OutputUnavailable(msg));
            return;
        }

        let path = path.to_path_buf();
        if let (Some(dir), Some(name)) = (path.parent(), path.file_name().and_then(|n| n.to_str()))
        {
            storage::prune(dir, name);
        }
        self.finish(path);
    }

    // ===== Normalize =====

    fn start_normalizing(&mut self, source: SourceRef) {
        let bytes = match self.platform.read_source(&source) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.fail(PickError::DecodeFailed(DecodeError::IoError(format!(
                    "{}: {}",
                    source, e
                ))));
                return;
            }
        };

        let Some(run) = self.run_id() else {
            return;
        };
        self.set_state(RunState::Normalizing { source });

        match &self.worker {
            Some(worker) => {
                if let Err(job) = worker.submit(Job { run, source: bytes }) {
                    let gone = std::io::Error::new(
                        std::io::ErrorKind::BrokenPipe,
                        "normalize worker stopped",
                    );
                    debug!(run = %job.run, "worker unavailable");
                    self.fail(PickError::NormalizeFailed(NormalizeError::Io(gone)));
                }
            }
            None => {
                let result = self.normalizer.normalize(&bytes);
                self.complete(Completion { run, result });
            }
        }
    }

    fn complete(&mut self, completion: Completion) {
        let current = self.run.as_ref().is_some_and(|r| {
            r.id == completion.run && matches!(r.state, RunState::Normalizing { .. })
        });
        if !current {
            debug!(run = %completion.run, "dropping result of abandoned run");
            if let Ok(image) = &completion.result {
                self.normalizer.discard(image);
            }
            return;
        }

        match completion.result {
            Ok(image) => {
                self.normalizer.prune_except(&image);
                self.finish(image.path);
            }
            Err(e) => self.fail(e.into()),
        }
    }

    // ===== Terminal =====

    fn finish(&mut self, location: PathBuf) {
        info!(run = ?self.run_id(), location = %location.display(), "image picked");
        self.latest = Some(location.clone());
        self.listener.on_image_picked(&location);
        self.set_state(RunState::Done { location });
    }

    fn fail(&mut self, error: PickError) {
        warn!(run = ?self.run_id(), error = %error, "pick failed");
        self.listener.on_pick_failed(&error);
        self.set_state(RunState::Failed { error });
    }

    fn cancel(&mut self, reason: PickError) {
        info!(run = ?self.run_id(), reason = %reason, "pick cancelled");
        self.set_state(RunState::Cancelled { reason });
    }
}
