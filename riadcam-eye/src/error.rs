//! Error types for riadcam-eye

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Camera error: {0}")]
    Device(String),

    #[error("Preview error: {0}")]
    Preview(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("OpenCV error: {0}")]
    OpenCv(String),
}

pub type Result<T> = std::result::Result<T, CameraError>;

impl From<image::ImageError> for CameraError {
    fn from(err: image::ImageError) -> Self {
        CameraError::Encode(err.to_string())
    }
}

#[cfg(feature = "opencv")]
impl From<opencv::Error> for CameraError {
    fn from(err: opencv::Error) -> Self {
        CameraError::OpenCv(err.message)
    }
}
