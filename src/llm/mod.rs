//! Hosted LLM clients behind narrow traits.
//!
//! `VisionClient` covers image-to-text extraction, `ChatClient` covers plain
//! text completion. Both are implemented over `reqwest::blocking` with a
//! fixed timeout; mock implementations live here for tests.

pub mod gemini;
pub mod groq;

pub use gemini::GeminiClient;
pub use groq::GroqClient;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("cannot reach {0}")]
    Connection(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("API returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("response parsing error: {0}")]
    ResponseShape(String),

    #[error("missing API key: set {0}")]
    MissingApiKey(&'static str),
}

/// Vision-language model: prompt plus one image, text back.
pub trait VisionClient {
    fn generate_from_image(
        &self,
        prompt: &str,
        image_base64: &str,
        mime_type: &str,
    ) -> Result<String, LlmError>;
}

/// Chat model: single user prompt, text back.
pub trait ChatClient {
    fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Mock vision client for tests, returns a configured response.
pub struct MockVisionClient {
    response: Result<String, String>,
}

impl MockVisionClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
        }
    }
}

impl VisionClient for MockVisionClient {
    fn generate_from_image(
        &self,
        _prompt: &str,
        _image_base64: &str,
        _mime_type: &str,
    ) -> Result<String, LlmError> {
        self.response.clone().map_err(LlmError::HttpClient)
    }
}

/// Mock chat client for tests, returns a configured response.
pub struct MockChatClient {
    response: Result<String, String>,
}

impl MockChatClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
        }
    }
}

impl ChatClient for MockChatClient {
    fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        self.response.clone().map_err(LlmError::HttpClient)
    }
}

/// Map a reqwest transport error to an `LlmError`.
pub(crate) fn map_transport_error(
    err: reqwest::Error,
    base_url: &str,
    timeout_secs: u64,
) -> LlmError {
    if err.is_connect() {
        LlmError::Connection(base_url.to_string())
    } else if err.is_timeout() {
        LlmError::Timeout(timeout_secs)
    } else {
        LlmError::HttpClient(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_vision_returns_configured_response() {
        let client = MockVisionClient::new("A | B\n1 | 2");
        let out = client.generate_from_image("p", "aGk=", "image/png").unwrap();
        assert_eq!(out, "A | B\n1 | 2");
    }

    #[test]
    fn mock_chat_failure_surfaces_as_error() {
        let client = MockChatClient::failing("boom");
        let err = client.complete("p").unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
