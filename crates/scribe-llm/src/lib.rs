pub mod types;
pub mod error;
pub mod config;
pub mod request;
pub mod streaming;
pub mod encoding;
pub mod buffer_utils;
pub mod openai;

pub use error::{LlmError, Result};
pub use config::ProviderConfig;
pub use request::{validate_transcript, ChatRequest};
pub use streaming::{ChatStreamChunk, DeltaFragment, OutputEvent};
pub use encoding::OutputMode;
pub use buffer_utils::{FragmentStream, FrameSource, LineBuffer};
pub use openai::OpenAIClient;
pub use types::Message;
