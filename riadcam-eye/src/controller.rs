//! Camera controller: lifecycle, frame access, preview and describe

use crate::backends;
use crate::capture::{run_capture_loop, CaptureStats, CaptureStatsSnapshot};
use crate::config::CameraConfig;
use crate::device::{CaptureBackend, PreviewBackend};
use crate::error::{CameraError, Result};
use crate::frame::Frame;
use crate::preview::run_preview_loop;
use crate::store::FrameStore;
use crate::vision::VisionClient;
use crate::worker::LoopHandle;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Returned by [`CameraController::describe_current_view`] before the first frame.
pub const NO_FRAME_MESSAGE: &str = "Camera frame is not available yet.";

/// Controller lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraState {
    Closed,
    Opening,
    Capturing,
}

#[derive(Default)]
struct Loops {
    capture: Option<LoopHandle>,
    preview: Option<LoopHandle>,
    /// Start the preview whenever capture is running
    preview_requested: bool,
}

/// Owns the capture and preview threads for one camera.
///
/// Lifecycle changes (`open`, `close`, `show_preview`, `hide_preview`) are
/// serialized; frame reads and describe calls only touch the frame store.
pub struct CameraController {
    config: CameraConfig,
    store: Arc<FrameStore>,
    stats: Arc<CaptureStats>,
    vision: VisionClient,
    capture_backend: Arc<dyn CaptureBackend>,
    preview_backend: Arc<dyn PreviewBackend>,
    loops: Mutex<Loops>,
    state: RwLock<CameraState>,
}

impl CameraController {
    /// Controller over the platform backends (see [`backends`]).
    pub fn new(config: CameraConfig) -> Self {
        Self::with_backends(
            config,
            backends::default_capture_backend(),
            backends::default_preview_backend(),
        )
    }

    /// Controller over caller-supplied device and window backends.
    pub fn with_backends(
        config: CameraConfig,
        capture_backend: Arc<dyn CaptureBackend>,
        preview_backend: Arc<dyn PreviewBackend>,
    ) -> Self {
        let vision = VisionClient::new(config.vision.clone());
        let loops = Loops {
            preview_requested: config.preview,
            ..Loops::default()
        };
        Self {
            config,
            store: Arc::new(FrameStore::new()),
            stats: Arc::new(CaptureStats::default()),
            vision,
            capture_backend,
            preview_backend,
            loops: Mutex::new(loops),
            state: RwLock::new(CameraState::Closed),
        }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn state(&self) -> CameraState {
        *self.state.read()
    }

    pub fn is_open(&self) -> bool {
        self.state() == CameraState::Capturing
    }

    /// Open the camera and start capturing. Returns `true` if capture is
    /// running afterwards; a device that cannot be acquired is logged and
    /// reported as `false`.
    pub fn open(&self) -> bool {
        match self.try_open() {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to open camera {}: {}", self.config.device_index, e);
                false
            }
        }
    }

    /// [`open`](Self::open) with the failure reason.
    pub fn try_open(&self) -> Result<()> {
        let mut loops = self.loops.lock();

        if loops.capture.is_some() {
            return Ok(());
        }

        self.set_state(CameraState::Opening);
        let device = match self.capture_backend.open(
            self.config.device_index,
            self.config.width,
            self.config.height,
        ) {
            Ok(device) => device,
            Err(e) => {
                self.set_state(CameraState::Closed);
                return Err(e);
            }
        };

        let store = self.store.clone();
        let stats = self.stats.clone();
        let capture = LoopHandle::spawn("riadcam-capture", move |token| {
            run_capture_loop(device, store, stats, token)
        });
        match capture {
            Ok(handle) => loops.capture = Some(handle),
            Err(e) => {
                self.set_state(CameraState::Closed);
                return Err(CameraError::Io(e));
            }
        }

        self.set_state(CameraState::Capturing);
        info!(
            "Camera {} opened at {}x{}",
            self.config.device_index, self.config.width, self.config.height
        );

        if loops.preview_requested {
            self.start_preview(&mut loops);
        }
        Ok(())
    }

    /// Stop capture and preview. Returns once both threads have exited and
    /// the device is released.
    pub fn close(&self) {
        let mut loops = self.loops.lock();
        let was_capturing = loops.capture.is_some();

        if let Some(preview) = loops.preview.take() {
            preview.stop();
        }
        loops.preview_requested = false;

        if let Some(capture) = loops.capture.take() {
            capture.stop();
        }
        self.set_state(CameraState::Closed);

        if was_capturing {
            info!("Camera {} closed", self.config.device_index);
        }
    }

    /// Copy of the latest frame, `None` before the first capture.
    pub fn get_frame(&self) -> Option<Frame> {
        self.store.get()
    }

    pub fn stats(&self) -> CaptureStatsSnapshot {
        self.stats.snapshot()
    }

    /// Describe the latest frame with the vision endpoint. No request is
    /// made when no frame has been captured yet.
    pub async fn describe_current_view(&self, prompt: &str) -> String {
        match self.get_frame() {
            Some(frame) => self.vision.describe(&frame, prompt).await,
            None => NO_FRAME_MESSAGE.to_string(),
        }
    }

    /// Show the preview window. While closed, the request is remembered and
    /// honored by the next [`open`](Self::open).
    pub fn show_preview(&self) {
        let mut loops = self.loops.lock();
        loops.preview_requested = true;
        if loops.capture.is_some() {
            self.start_preview(&mut loops);
        }
    }

    /// Stop the preview and release its window. Capture keeps running.
    pub fn hide_preview(&self) {
        let mut loops = self.loops.lock();
        loops.preview_requested = false;
        if let Some(preview) = loops.preview.take() {
            preview.stop();
        }
    }

    pub fn is_preview_running(&self) -> bool {
        self.loops
            .lock()
            .preview
            .as_ref()
            .map_or(false, LoopHandle::is_active)
    }

    fn start_preview(&self, loops: &mut Loops) {
        if loops.preview.as_ref().map_or(false, LoopHandle::is_active) {
            return;
        }
        // reap a loop that ended on ESC or on a window error
        if let Some(finished) = loops.preview.take() {
            finished.stop();
        }

        let backend = self.preview_backend.clone();
        let window_name = self.config.window_name.clone();
        let store = self.store.clone();
        match LoopHandle::spawn("riadcam-preview", move |token| {
            run_preview_loop(backend, window_name, store, token)
        }) {
            Ok(handle) => loops.preview = Some(handle),
            Err(e) => warn!("Failed to start preview thread: {}", e),
        }
    }

    fn set_state(&self, state: CameraState) {
        let mut current = self.state.write();
        if *current != state {
            debug!("Camera {} state {:?} -> {:?}", self.config.device_index, *current, state);
            *current = state;
        }
    }
}

impl Drop for CameraController {
    fn drop(&mut self) {
        self.close();
    }
}
