use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Missing or invalid transcript: {0}")]
    InvalidInput(String),

    #[error("LLM API returned {status}")]
    UpstreamRejected { status: StatusCode, body: String },

    #[error("LLM API returned no body")]
    UpstreamNoBody,

    #[error("Upstream stream error: {0}")]
    UpstreamTransport(String),

    /// A single unparsable upstream line. Recovered inside the decoder.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Failed to encode output event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// True for failures caused by the provider rather than by the caller.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            LlmError::UpstreamRejected { .. }
                | LlmError::UpstreamNoBody
                | LlmError::UpstreamTransport(_)
                | LlmError::Http(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
