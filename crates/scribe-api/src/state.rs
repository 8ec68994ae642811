use std::sync::Arc;
use scribe_llm::{OpenAIClient, OutputMode};
use crate::config::Config;

/// Shared application state passed to all handlers
///
/// Built once at startup and read-only afterwards. Relay sessions borrow from
/// it and never write to it.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: Arc<OpenAIClient>,
    pub system_prompt: Arc<str>,
}

impl AppState {
    pub fn new(config: Config, client: OpenAIClient, system_prompt: impl Into<Arc<str>>) -> Self {
        Self {
            config: Arc::new(config),
            client: Arc::new(client),
            system_prompt: system_prompt.into(),
        }
    }

    pub fn output_mode(&self) -> OutputMode {
        self.config.output.mode
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }
}
