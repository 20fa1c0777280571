//! Configuration for riadcam-eye

use crate::error::{CameraError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default Ollama generate endpoint.
pub const DEFAULT_VISION_URL: &str = "http://127.0.0.1:11434/api/generate";
/// Default vision model served by the endpoint.
pub const DEFAULT_VISION_MODEL: &str = "llava:7b";
/// Default preview window title.
pub const DEFAULT_WINDOW_NAME: &str = "RiadCam";

/// Inference endpoint settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Full URL of the generate endpoint
    pub endpoint: String,
    /// Model identifier sent with every request
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_VISION_URL.to_string(),
            model: DEFAULT_VISION_MODEL.to_string(),
            timeout_secs: 120,
        }
    }
}

impl VisionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Camera controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Capture device index (0, 1, 2, etc.)
    pub device_index: u32,
    /// Requested capture width
    pub width: u32,
    /// Requested capture height
    pub height: u32,
    /// Start the preview window together with capture
    pub preview: bool,
    /// Title of the preview window
    pub window_name: String,
    /// Inference endpoint settings
    pub vision: VisionConfig,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: 1280,
            height: 720,
            preview: false,
            window_name: DEFAULT_WINDOW_NAME.to_string(),
            vision: VisionConfig::default(),
        }
    }
}

impl CameraConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Load configuration from a JSON, TOML or YAML document
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        if let Ok(config) = serde_json::from_str::<CameraConfig>(content) {
            return Ok(config);
        }

        if let Ok(config) = toml::from_str::<CameraConfig>(content) {
            return Ok(config);
        }

        if let Ok(config) = serde_yaml::from_str::<CameraConfig>(content) {
            return Ok(config);
        }

        Err(CameraError::Config("Unknown format".to_string()))
    }

    /// Defaults overridden by `RIADCAM_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `RIADCAM_*` environment variables.
    /// Unparseable values are ignored.
    pub fn apply_env(&mut self) {
        fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
            std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
        }

        if let Some(index) = parsed("RIADCAM_DEVICE") {
            self.device_index = index;
        }
        if let Some(width) = parsed("RIADCAM_WIDTH") {
            self.width = width;
        }
        if let Some(height) = parsed("RIADCAM_HEIGHT") {
            self.height = height;
        }
        if let Some(preview) = parsed("RIADCAM_PREVIEW") {
            self.preview = preview;
        }
        if let Ok(name) = std::env::var("RIADCAM_WINDOW_NAME") {
            self.window_name = name;
        }
        if let Ok(url) = std::env::var("RIADCAM_VISION_URL") {
            self.vision.endpoint = url;
        }
        if let Ok(model) = std::env::var("RIADCAM_VISION_MODEL") {
            self.vision.model = model;
        }
        if let Some(secs) = parsed("RIADCAM_VISION_TIMEOUT_SECS") {
            self.vision.timeout_secs = secs;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CameraError::Config("Resolution must be non-zero".to_string()));
        }

        if self.width > 7680 || self.height > 4320 {
            return Err(CameraError::Config("Resolution too large (max 8K)".to_string()));
        }

        if self.device_index > 100 {
            return Err(CameraError::Config("Device index too large (max 100)".to_string()));
        }

        if self.window_name.trim().is_empty() {
            return Err(CameraError::Config("Window name cannot be empty".to_string()));
        }

        if !self.vision.endpoint.starts_with("http://") && !self.vision.endpoint.starts_with("https://") {
            return Err(CameraError::Config(format!(
                "Vision endpoint must be an http(s) URL: '{}'",
                self.vision.endpoint
            )));
        }

        if self.vision.model.trim().is_empty() {
            return Err(CameraError::Config("Vision model cannot be empty".to_string()));
        }

        if self.vision.timeout_secs == 0 {
            return Err(CameraError::Config("Vision timeout must be at least 1 second".to_string()));
        }

        Ok(())
    }
}
