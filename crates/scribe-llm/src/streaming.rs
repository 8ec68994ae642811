use serde::{Deserialize, Serialize};

/// Normalized event relayed downstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputEvent {
    Thinking {
        content: String,
    },

    Content {
        content: String,
    },
}

/// Decoded payload of one upstream frame
///
/// Never constructed with both channels absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaFragment {
    content: Option<String>,
    reasoning: Option<String>,
}

impl DeltaFragment {
    /// Returns `None` when neither channel carries text
    pub fn new(content: Option<String>, reasoning: Option<String>) -> Option<Self> {
        let content = content.filter(|s| !s.is_empty());
        let reasoning = reasoning.filter(|s| !s.is_empty());

        if content.is_none() && reasoning.is_none() {
            return None;
        }

        Some(Self { content, reasoning })
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn reasoning(&self) -> Option<&str> {
        self.reasoning.as_deref()
    }

    /// Reasoning is emitted before the answer text it supports
    pub fn into_events(self) -> Vec<OutputEvent> {
        let mut events = Vec::with_capacity(2);

        if let Some(content) = self.reasoning {
            events.push(OutputEvent::Thinking { content });
        }
        if let Some(content) = self.content {
            events.push(OutputEvent::Content { content });
        }

        events
    }
}

// ============================================================================
// PROVIDER CHUNK TYPES (chat completions streaming)
// ============================================================================

/// One `chat.completion.chunk` object. Every field is optional so that
/// providers with sparse chunks still deserialize.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatStreamChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Option<Vec<StreamChoice>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub delta: Option<Delta>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    /// Reasoning channel emitted by DeepSeek-style providers
    #[serde(default)]
    pub reasoning_content: Option<String>,
}

impl ChatStreamChunk {
    /// Build a chunk carrying a single delta, as a client library would yield it
    pub fn from_delta(content: Option<&str>, reasoning_content: Option<&str>) -> Self {
        Self {
            choices: Some(vec![StreamChoice {
                index: Some(0),
                delta: Some(Delta {
                    role: None,
                    content: content.map(str::to_string),
                    reasoning_content: reasoning_content.map(str::to_string),
                }),
                finish_reason: None,
            }]),
            ..Default::default()
        }
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.choices
            .as_ref()
            .and_then(|choices| choices.first())
            .and_then(|c| c.finish_reason.as_deref())
    }

    /// Extract `choices[0].delta` as a fragment
    pub fn extract_delta(&self) -> Option<DeltaFragment> {
        let delta = self.choices.as_ref()?.first()?.delta.as_ref()?;
        DeltaFragment::new(delta.content.clone(), delta.reasoning_content.clone())
    }
}
