use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use scribe_llm::LlmError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Llm(LlmError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Llm(e) if e.is_upstream() => StatusCode::BAD_GATEWAY,
            ApiError::Llm(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(_) => self.to_string(),
            ApiError::Llm(ref e) if status != StatusCode::INTERNAL_SERVER_ERROR => {
                // Upstream error bodies are logged by the client, never echoed
                tracing::warn!(status = %status, error = %e, "Request failed");
                e.to_string()
            }
            ApiError::Llm(ref e) => {
                tracing::error!("Internal error: {}", e);
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
