//! Platform backends for the capture and preview seams

use crate::device::{CaptureBackend, PreviewBackend};
use std::sync::Arc;

#[cfg(feature = "opencv")]
pub mod opencv;

#[cfg(feature = "opencv")]
pub fn default_capture_backend() -> Arc<dyn CaptureBackend> {
    Arc::new(opencv::OpenCvCapture)
}

#[cfg(feature = "opencv")]
pub fn default_preview_backend() -> Arc<dyn PreviewBackend> {
    Arc::new(opencv::HighGuiPreview)
}

#[cfg(not(feature = "opencv"))]
pub fn default_capture_backend() -> Arc<dyn CaptureBackend> {
    Arc::new(crate::device::UnavailableCapture)
}

#[cfg(not(feature = "opencv"))]
pub fn default_preview_backend() -> Arc<dyn PreviewBackend> {
    Arc::new(crate::device::UnavailablePreview)
}
