//! Vision client for an Ollama-style `/api/generate` endpoint

use crate::config::VisionConfig;
use crate::error::Result;
use crate::frame::Frame;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Prompt used when the caller has nothing more specific to ask.
pub const DEFAULT_DESCRIBE_PROMPT: &str = "Describe what you see in at most 4 short sentences. \
Be concise. The entire answer must be under 60 words. \
If there is visible text, add one last sentence starting with 'Text: ' and write the text.";

/// Prompt used by the controller's describe-current-view shortcut.
pub const DEFAULT_VIEW_PROMPT: &str = "Shortly describe what is in front of the camera.";

pub const ENCODE_FAILED_MESSAGE: &str = "Failed to encode camera frame.";
pub const EMPTY_RESPONSE_MESSAGE: &str = "Model returned empty response.";
pub const REQUEST_FAILED_PREFIX: &str = "Vision request failed: ";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    images: Vec<String>,
}

/// Sends frames to the inference endpoint. One request per call, no retries.
#[derive(Debug, Clone)]
pub struct VisionClient {
    client: Client,
    config: VisionConfig,
}

impl VisionClient {
    pub fn new(config: VisionConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    /// Describe `frame`. Every failure is folded into the returned text:
    /// an encode failure gives [`ENCODE_FAILED_MESSAGE`], a transport or
    /// HTTP failure gives [`REQUEST_FAILED_PREFIX`] followed by the error,
    /// and a missing or blank answer gives [`EMPTY_RESPONSE_MESSAGE`].
    pub async fn describe(&self, frame: &Frame, prompt: &str) -> String {
        let jpeg = match frame.encode_jpeg() {
            Ok(jpeg) => jpeg,
            Err(e) => {
                warn!("Could not encode frame for vision request: {}", e);
                return ENCODE_FAILED_MESSAGE.to_string();
            }
        };

        match self.generate(&jpeg, prompt).await {
            Ok(text) if text.is_empty() => EMPTY_RESPONSE_MESSAGE.to_string(),
            Ok(text) => text,
            Err(e) => {
                warn!("Vision request to {} failed: {}", self.config.endpoint, e);
                format!("{}{}", REQUEST_FAILED_PREFIX, e)
            }
        }
    }

    /// Like [`describe`](Self::describe) but hands back the error. A blank
    /// answer is `Ok("")`.
    pub async fn try_describe(&self, frame: &Frame, prompt: &str) -> Result<String> {
        let jpeg = frame.encode_jpeg()?;
        self.generate(&jpeg, prompt).await
    }

    async fn generate(&self, jpeg: &[u8], prompt: &str) -> Result<String> {
        let payload = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            images: vec![general_purpose::STANDARD.encode(jpeg)],
        };

        debug!(
            "Sending {} byte JPEG to {} (model {})",
            jpeg.len(),
            self.config.endpoint,
            self.config.model
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .timeout(self.config.timeout())
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        Ok(response_text(&body))
    }
}

/// Trimmed `response` field, empty for any other shape.
fn response_text(body: &Value) -> String {
    body.get("response")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}
