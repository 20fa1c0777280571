//! Single-slot, last-write-wins frame buffer

use crate::frame::Frame;
use parking_lot::Mutex;

/// Holds the most recently captured frame.
///
/// The lock is only held to swap or clone the frame, never across device
/// reads, rendering or network calls.
#[derive(Debug, Default)]
pub struct FrameStore {
    slot: Mutex<Option<Frame>>,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored frame.
    pub fn put(&self, frame: Frame) {
        // the previous frame is dropped after the guard is released
        let _previous = self.slot.lock().replace(frame);
    }

    /// Deep copy of the current frame, `None` until the first `put`.
    pub fn get(&self) -> Option<Frame> {
        self.slot.lock().clone()
    }

    pub fn has_frame(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Forget the stored frame.
    pub fn clear(&self) {
        let _previous = self.slot.lock().take();
    }
}
