use axum::{
    body::{Body, Bytes},
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::Instrument;
use utoipa::ToSchema;

use scribe_llm::{validate_transcript, ChatRequest};
use crate::{
    error::{ApiError, ApiResult},
    relay::{RelaySession, SessionId},
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateRequest {
    /// Raw transcript text. Validated by hand so that wrong types map to 400.
    #[serde(default)]
    #[schema(value_type = String)]
    pub transcript: Option<serde_json::Value>,
}

/// Stream a completion generated from a transcript
#[utoipa::path(
    post,
    path = "/api/generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Streamed model output", content_type = "text/plain"),
        (status = 400, description = "Missing or invalid transcript"),
        (status = 502, description = "Upstream provider failed before streaming began")
    ),
    tag = "generate"
)]
pub async fn generate(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Response> {
    // Parsed regardless of Content-Type; browsers post string bodies as text/plain
    let req: GenerateRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?;

    // Validated before any upstream I/O
    let transcript = validate_transcript(req.transcript.as_ref())?;
    let request = ChatRequest::new(&*state.system_prompt, transcript, state.model())?;

    let session = RelaySession::new(state.output_mode());
    let session_id = SessionId(session.id());
    tracing::info!(
        session = %session.id(),
        model = request.model(),
        transcript_chars = request.user_transcript().chars().count(),
        "Starting relay"
    );

    let span = tracing::info_span!("relay", session = %session.id(), model = request.model());
    let body = session
        .start(&state.client, &request)
        .instrument(span)
        .await?;

    let mut response = streaming_response(Body::from_stream(body));
    response.extensions_mut().insert(session_id);
    Ok(response)
}

pub fn streaming_response(body: Body) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        body,
    )
        .into_response()
}
