// OpenAI-compatible chat completions client (HTTP direct, no SDK)

use crate::buffer_utils::FrameSource;
use crate::config::ProviderConfig;
use crate::error::{LlmError, Result};
use crate::request::ChatRequest;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

/// Streaming client for one configured provider
///
/// Built once at startup; the inner `reqwest::Client` pools connections for
/// every relay session.
pub struct OpenAIClient {
    http_client: reqwest::Client,
    completions_url: String,
    model: String,
}

impl OpenAIClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| LlmError::Config("Invalid API key format".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        headers.insert(AUTHORIZATION, auth);

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            http_client,
            completions_url: config.completions_url(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn completions_url(&self) -> &str {
        &self.completions_url
    }

    /// Send a streaming chat completion request.
    ///
    /// A non-success status is read to completion for diagnostics and
    /// returned as `UpstreamRejected`. On success the response body is handed
    /// back unread as an SSE frame source.
    pub async fn chat_stream(&self, request: &ChatRequest) -> Result<FrameSource> {
        tracing::info!(url = %self.completions_url, model = request.model(), "Calling LLM");

        let response = self
            .http_client
            .post(&self.completions_url)
            .json(&request.to_payload())
            .send()
            .await
            .map_err(|e| LlmError::UpstreamTransport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "LLM API error");
            return Err(LlmError::UpstreamRejected { status, body });
        }

        Ok(FrameSource::sse(response.bytes_stream()))
    }
}
