use crate::error::{LlmError, Result};
use crate::types::Message;
use serde_json::Value;

/// Validate the `transcript` field of an inbound request body.
///
/// Missing, `null`, non-string and empty values are rejected. Runs before any
/// network I/O.
pub fn validate_transcript(transcript: Option<&Value>) -> Result<String> {
    match transcript {
        Some(Value::String(text)) if !text.is_empty() => Ok(text.clone()),
        Some(Value::String(_)) => Err(LlmError::InvalidInput("transcript is empty".to_string())),
        Some(Value::Null) | None => {
            Err(LlmError::InvalidInput("transcript is missing".to_string()))
        }
        Some(_) => Err(LlmError::InvalidInput("transcript must be a string".to_string())),
    }
}

/// Outbound streaming chat completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    system_prompt: String,
    user_transcript: String,
    model: String,
}

impl ChatRequest {
    pub fn new(
        system_prompt: impl Into<String>,
        user_transcript: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let user_transcript = user_transcript.into();
        if user_transcript.is_empty() {
            return Err(LlmError::InvalidInput("transcript is empty".to_string()));
        }

        Ok(Self {
            system_prompt: system_prompt.into(),
            user_transcript,
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn user_transcript(&self) -> &str {
        &self.user_transcript
    }

    /// Always true: the relay only speaks the streaming protocol
    pub fn stream(&self) -> bool {
        true
    }

    pub fn messages(&self) -> Vec<Message> {
        vec![
            Message::system(self.system_prompt.as_str()),
            Message::human(self.user_transcript.as_str()),
        ]
    }

    /// Build the chat completions payload
    pub fn to_payload(&self) -> Value {
        serde_json::json!({
            "model": self.model,
            "stream": self.stream(),
            "messages": self.messages(),
        })
    }
}
