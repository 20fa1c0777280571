//! Fake capture and preview backends shared by the integration tests

#![allow(dead_code)]

use riadcam_eye::{
    CameraError, CaptureBackend, CaptureDevice, Frame, PreviewBackend, PreviewWindow, Result,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Camera that produces 4x2 solid frames roughly every millisecond.
#[derive(Default)]
pub struct FakeCapture {
    pub opens: AtomicUsize,
    pub reads: Arc<AtomicUsize>,
    pub releases: Arc<AtomicUsize>,
    pub unavailable: AtomicBool,
    /// Requested (width, height) of the last open
    pub last_request: parking_lot::Mutex<Option<(u32, u32)>>,
}

impl FakeCapture {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn unavailable() -> Arc<Self> {
        let fake = Self::default();
        fake.unavailable.store(true, Ordering::SeqCst);
        Arc::new(fake)
    }
}

impl CaptureBackend for FakeCapture {
    fn open(&self, index: u32, width: u32, height: u32) -> Result<Box<dyn CaptureDevice>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CameraError::Device(format!("Camera {} failed to open", index)));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some((width, height));
        Ok(Box::new(FakeDevice {
            reads: self.reads.clone(),
            releases: self.releases.clone(),
        }))
    }
}

struct FakeDevice {
    reads: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

impl CaptureDevice for FakeDevice {
    fn read(&mut self) -> Result<Frame> {
        thread::sleep(Duration::from_millis(1));
        let n = self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(Frame::solid(4, 2, [(n % 256) as u8, 0, 0]))
    }

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Window backend that records what happens to its windows.
#[derive(Default)]
pub struct FakePreview {
    pub creates: AtomicUsize,
    pub shown: Arc<AtomicUsize>,
    pub destroys: Arc<AtomicUsize>,
    /// Report ESC on this poll (1-based); 0 never presses it
    pub esc_on_poll: usize,
    pub fail_destroy: bool,
    pub fail_create: bool,
}

impl PreviewBackend for FakePreview {
    fn create(&self, window_name: &str) -> Result<Box<dyn PreviewWindow>> {
        if self.fail_create {
            return Err(CameraError::Preview(format!("cannot open '{}'", window_name)));
        }
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeWindow {
            polls: 0,
            esc_on_poll: self.esc_on_poll,
            fail_destroy: self.fail_destroy,
            shown: self.shown.clone(),
            destroys: self.destroys.clone(),
        }))
    }
}

struct FakeWindow {
    polls: usize,
    esc_on_poll: usize,
    fail_destroy: bool,
    shown: Arc<AtomicUsize>,
    destroys: Arc<AtomicUsize>,
}

impl PreviewWindow for FakeWindow {
    fn show(&mut self, _frame: &Frame) -> Result<()> {
        self.shown.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn poll_key(&mut self) -> Result<Option<i32>> {
        self.polls += 1;
        if self.esc_on_poll != 0 && self.polls == self.esc_on_poll {
            Ok(Some(27))
        } else {
            Ok(None)
        }
    }

    fn destroy(&mut self) -> Result<()> {
        self.destroys.fetch_add(1, Ordering::SeqCst);
        if self.fail_destroy {
            Err(CameraError::Preview("window already gone".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Poll `cond` until it holds or two seconds pass.
pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}
