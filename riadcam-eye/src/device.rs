//! Seams to the platform camera and window system

use crate::error::{CameraError, Result};
use crate::frame::Frame;

/// Key code that closes the preview window.
pub const ESC_KEY: i32 = 27;

/// Opens capture devices.
pub trait CaptureBackend: Send + Sync {
    /// Acquire device `index` and request `width`x`height`.
    /// The device may deliver a different resolution if it cannot honor it.
    fn open(&self, index: u32, width: u32, height: u32) -> Result<Box<dyn CaptureDevice>>;
}

/// An acquired capture device, owned by the capture loop.
pub trait CaptureDevice: Send {
    /// Block until the next frame is available.
    fn read(&mut self) -> Result<Frame>;

    /// Give the device back to the system. Called once when the loop exits.
    fn release(&mut self);
}

/// Creates preview windows.
///
/// `create` is called on the preview thread, which then owns the window
/// for its whole life.
pub trait PreviewBackend: Send + Sync {
    fn create(&self, window_name: &str) -> Result<Box<dyn PreviewWindow>>;
}

pub trait PreviewWindow {
    fn show(&mut self, frame: &Frame) -> Result<()>;

    /// Pump window events and return the pressed key, if any. Never blocks
    /// for longer than a millisecond.
    fn poll_key(&mut self) -> Result<Option<i32>>;

    fn destroy(&mut self) -> Result<()>;
}

/// Stands in when no camera backend is compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableCapture;

impl CaptureBackend for UnavailableCapture {
    fn open(&self, index: u32, _width: u32, _height: u32) -> Result<Box<dyn CaptureDevice>> {
        Err(CameraError::Device(format!(
            "No capture backend available for camera {} (build with the `opencv` feature)",
            index
        )))
    }
}

/// Stands in when no window backend is compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailablePreview;

impl PreviewBackend for UnavailablePreview {
    fn create(&self, window_name: &str) -> Result<Box<dyn PreviewWindow>> {
        Err(CameraError::Preview(format!(
            "No preview backend available for window '{}' (build with the `opencv` feature)",
            window_name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_capture_fails_to_open() {
        let err = UnavailableCapture.open(0, 640, 480).err().unwrap();
        assert!(matches!(err, CameraError::Device(_)));
        assert!(err.to_string().contains("camera 0"));
    }

    #[test]
    fn test_unavailable_preview_fails_to_create() {
        let err = UnavailablePreview.create("RiadCam").err().unwrap();
        assert!(matches!(err, CameraError::Preview(_)));
    }
}
