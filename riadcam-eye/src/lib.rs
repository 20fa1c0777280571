//! riadcam-eye: camera capture, live preview and scene description
//!
//! A background thread keeps the newest camera frame in a single-slot
//! [`FrameStore`]; an optional second thread renders it to a preview
//! window; [`VisionClient`] sends a frame to an Ollama-style vision model
//! and returns its description. [`CameraController`] ties the pieces
//! together.

pub mod backends;
pub mod capture;
pub mod config;
pub mod controller;
pub mod device;
pub mod error;
pub mod frame;
pub mod preview;
pub mod store;
pub mod vision;
mod worker;

pub use capture::CaptureStatsSnapshot;
pub use config::{CameraConfig, VisionConfig};
pub use controller::{CameraController, CameraState, NO_FRAME_MESSAGE};
pub use device::{CaptureBackend, CaptureDevice, PreviewBackend, PreviewWindow};
pub use error::{CameraError, Result};
pub use frame::Frame;
pub use store::FrameStore;
pub use vision::{VisionClient, DEFAULT_DESCRIBE_PROMPT, DEFAULT_VIEW_PROMPT};
