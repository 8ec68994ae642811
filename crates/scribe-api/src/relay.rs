// Relay controller: one session per inbound request, pairing the upstream
// frame source with the downstream response body.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use uuid::Uuid;

use scribe_llm::{ChatRequest, FrameSource, LlmError, OpenAIClient, OutputMode};

/// Downstream body. An `Err` item aborts the HTTP response.
pub type RelayBody = Pin<Box<dyn Stream<Item = Result<Bytes, LlmError>> + Send>>;

/// Session id attached to the response extensions for request logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    RequestSent,
    Streaming,
    Completed,
    Failed,
}

impl RelayState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RelayState::Completed | RelayState::Failed)
    }
}

/// Unit of work for one HTTP request
///
/// Owns the upstream source once streaming starts and moves into the body
/// stream, so dropping the body (client gone) drops the upstream connection.
pub struct RelaySession {
    id: Uuid,
    mode: OutputMode,
    state: RelayState,
    bytes_relayed: usize,
}

impl RelaySession {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            state: RelayState::Idle,
            bytes_relayed: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Send the request and wait until the upstream body is readable.
    ///
    /// Every error returned here happens before any downstream byte, so the
    /// caller can still answer with a clean error status.
    pub async fn start(
        mut self,
        client: &OpenAIClient,
        request: &ChatRequest,
    ) -> Result<RelayBody, LlmError> {
        self.transition(RelayState::RequestSent);

        match client.chat_stream(request).await {
            Ok(source) => self.attach(source).await,
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Attach an already-open upstream source and start streaming
    pub async fn attach(mut self, source: FrameSource) -> Result<RelayBody, LlmError> {
        if self.state == RelayState::Idle {
            self.transition(RelayState::RequestSent);
        }

        match source.ready().await {
            Ok(source) => {
                self.transition(RelayState::Streaming);
                Ok(self.into_body(source))
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    fn into_body(mut self, source: FrameSource) -> RelayBody {
        Box::pin(async_stream::stream! {
            let mut fragments = source.into_fragments();

            while let Some(next) = fragments.next().await {
                let fragment = match next {
                    Ok(fragment) => fragment,
                    Err(e) => {
                        self.fail(&e);
                        yield Err(e);
                        return;
                    }
                };

                for event in fragment.into_events() {
                    match self.mode.encode(&event) {
                        Ok(Some(bytes)) => {
                            self.bytes_relayed += bytes.len();
                            yield Ok(bytes);
                        }
                        Ok(None) => {}
                        Err(e) => {
                            self.fail(&e);
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            self.transition(RelayState::Completed);
        })
    }

    fn transition(&mut self, next: RelayState) {
        if self.state.is_terminal() {
            tracing::debug!(
                session = %self.id,
                state = ?self.state,
                ignored = ?next,
                "Relay already closed"
            );
            return;
        }

        tracing::debug!(session = %self.id, from = ?self.state, to = ?next, "Relay transition");
        self.state = next;

        if next == RelayState::Completed {
            tracing::info!(session = %self.id, bytes = self.bytes_relayed, "Relay completed");
        }
    }

    fn fail(&mut self, error: &LlmError) {
        if self.state.is_terminal() {
            return;
        }

        tracing::error!(
            session = %self.id,
            state = ?self.state,
            bytes = self.bytes_relayed,
            error = %error,
            "Relay failed"
        );
        self.state = RelayState::Failed;
    }
}

impl Drop for RelaySession {
    fn drop(&mut self) {
        if self.state == RelayState::Streaming {
            tracing::info!(
                session = %self.id,
                bytes = self.bytes_relayed,
                "Downstream closed mid-stream, releasing upstream"
            );
        }
    }
}
