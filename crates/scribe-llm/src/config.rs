// Provider configuration, built once at startup and shared read-only by every
// relay session.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Connection details for an OpenAI-compatible chat completions provider
#[derive(Clone, Deserialize)]
pub struct ProviderConfig {
    /// Base URL, e.g. "https://api.openai.com/v1". `/chat/completions` is appended.
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

impl ProviderConfig {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
            connect_timeout_secs: None,
        }
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = Some(secs);
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(
            self.connect_timeout_secs
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }

    /// Full chat completions URL, tolerating a trailing slash on the base URL
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}
