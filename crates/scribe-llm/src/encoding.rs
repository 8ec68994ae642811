use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{LlmError, Result};
use crate::streaming::OutputEvent;

/// Downstream wire format, fixed per deployment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Raw answer text only. Thinking events are dropped.
    #[default]
    Plain,
    /// One `{"type": ..., "content": ...}` JSON object per line
    Typed,
}

impl OutputMode {
    /// Encode one event. `Ok(None)` means the event has no representation in
    /// this mode.
    pub fn encode(&self, event: &OutputEvent) -> Result<Option<Bytes>> {
        match self {
            OutputMode::Plain => match event {
                OutputEvent::Content { content } => Ok(Some(Bytes::from(content.clone()))),
                OutputEvent::Thinking { .. } => Ok(None),
            },
            OutputMode::Typed => {
                let mut line = serde_json::to_vec(event)?;
                line.push(b'\n');
                Ok(Some(Bytes::from(line)))
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::Plain => "plain",
            OutputMode::Typed => "typed",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputMode {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(OutputMode::Plain),
            "typed" => Ok(OutputMode::Typed),
            other => Err(LlmError::Config(format!("unknown output mode: {}", other))),
        }
    }
}
