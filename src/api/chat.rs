use std::convert::Infallible;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::Json;
use futures_util::stream::{Stream, StreamExt};

use crate::api::{completion_events, reject};
use crate::error::Error;
use crate::llm::chat_stream::{select_provider, stream_completion};
use crate::models::ChatRequest;
use crate::state::AppState;

/// POST /api/chat — completion proxy. Forwards the caller's message list to
/// the provider selected by the requested model and streams deltas back.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    if req.messages.is_empty() {
        return Err(reject(Error::InvalidQuery(
            "messages must not be empty".to_string(),
        )));
    }
    if let Some(message) = req
        .messages
        .iter()
        .find(|m| !matches!(m.role.as_str(), "system" | "user" | "assistant"))
    {
        return Err(reject(Error::InvalidQuery(format!(
            "unsupported message role '{}'",
            message.role
        ))));
    }

    let _permit = state
        .completion_semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "completion service at capacity".to_string(),
            )
        })?;

    // Credential problems surface here, before any network call.
    let target = select_provider(&state.config.completion, req.model.as_deref()).map_err(reject)?;

    let llm_stream = stream_completion(
        &state.http_client,
        &target,
        req.messages,
        state.config.completion.max_tokens,
    )
    .await
    .map_err(reject)?;

    // Hold the semaphore permit for the lifetime of the stream.
    let events = completion_events(llm_stream).map(move |event| {
        let _permit = &_permit;
        event
    });

    Ok(Sse::new(events))
}
