use std::convert::Infallible;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::Json;
use futures_util::stream::{self, Stream, StreamExt};

use crate::api::{completion_events, context_event, reject};
use crate::error::Error;
use crate::llm::chat_stream::{select_provider, stream_completion};
use crate::models::{SearchRequest, SourceRef};
use crate::prompt::build_conversation;
use crate::retrieval::{RetrievalQuery, RetrieveOptions};
use crate::state::AppState;

/// POST /api/search — the full answer flow: embed the query, retrieve the
/// nearest chunks (parent documents and surrounding siblings attached),
/// assemble the cited conversation, and stream the completion. SSE order:
/// one `context` event with the sources, then `delta`s, then `done`.
pub async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    let query = req.query.trim().to_string();
    if query.is_empty() {
        return Err(reject(Error::InvalidQuery(
            "you must input a search query".to_string(),
        )));
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

    // A search failure is surfaced to the caller — no degrade here.
    let options = RetrieveOptions {
        include_document: true,
        include_surrounding: true,
        topic: None,
    };
    let hits = state
        .retriever
        .retrieve(&RetrievalQuery::text(query.clone()), req.k, &options)
        .await
        .map_err(reject)?;

    let sources: Vec<SourceRef> = hits.iter().map(SourceRef::from).collect();
    let messages = build_conversation(
        &query,
        &sources,
        req.custom_instructions.as_deref(),
        req.selected_state.as_deref(),
    );

    let target = select_provider(&state.config.completion, req.model.as_deref()).map_err(reject)?;
    let llm_stream = stream_completion(
        &state.http_client,
        &target,
        messages,
        state.config.completion.max_tokens,
    )
    .await
    .map_err(reject)?;

    let context = context_event(&sources);
    let events = stream::once(async move { Ok(context) })
        .chain(completion_events(llm_stream))
        .map(move |event| {
            let _permit = &_permit;
            event
        });

    Ok(Sse::new(events))
}
