pub mod candidates;
pub mod chat;
pub mod search;

use std::convert::Infallible;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::sse::Event;
use futures_util::stream::{self, Stream, StreamExt};

use crate::error::Error;
use crate::llm::chat_stream::CompletionStream;
use crate::models::{ScoredChunk, SourceRef};
use crate::stream_state::StreamConsumer;

/// Abort a stalled upstream stream after this long without a delta.
const IDLE_TIMEOUT_SECS: u64 = 30;

/// The `(status, message)` rejection every handler returns on failure.
pub(crate) fn reject(err: Error) -> (StatusCode, String) {
    err.into_response_parts()
}

/// The sanctioned degrade: an embedding or retrieval failure during a page
/// render yields an empty source list instead of failing the page. Applied
/// only where a handler opts in — never as a catch-all.
pub(crate) fn degrade_to_empty(
    result: crate::error::Result<Vec<ScoredChunk>>,
    surface: &str,
) -> Vec<ScoredChunk> {
    match result {
        Ok(hits) => hits,
        Err(e) => {
            tracing::warn!("{surface}: degrading to empty sources: {e}");
            Vec::new()
        }
    }
}

/// Drop sources that repeat an earlier entry's URL or title, keeping first
/// occurrences in order.
pub(crate) fn dedup_sources(sources: &[SourceRef]) -> Vec<SourceRef> {
    let mut kept: Vec<SourceRef> = Vec::with_capacity(sources.len());
    for source in sources {
        let duplicate = kept.iter().any(|seen| {
            (source.url.is_some() && seen.url == source.url)
                || (source.title.is_some() && seen.title == source.title)
        });
        if !duplicate {
            kept.push(source.clone());
        }
    }
    kept
}

/// Forward a completion stream as SSE `delta` events, ending with `done`.
///
/// A [`StreamConsumer`] tracks the response lifecycle: deltas push into it,
/// upstream end finishes it, and an upstream error or idle timeout fails it
/// (emitting one `error` event before stopping). If the client disconnects
/// mid-stream the consumer is dropped while streaming and records the
/// cancellation.
pub(crate) fn completion_events(
    llm_stream: CompletionStream,
) -> impl Stream<Item = Result<Event, Infallible>> + Send {
    let idle_timeout = Duration::from_secs(IDLE_TIMEOUT_SECS);

    let delta_stream = stream::unfold(
        (llm_stream, StreamConsumer::new()),
        move |(mut llm_stream, mut consumer)| async move {
            if !consumer.is_in_progress() {
                return None;
            }
            match tokio::time::timeout(idle_timeout, llm_stream.next()).await {
                Ok(Some(Ok(content))) => {
                    consumer.push(&content);
                    let event: Result<Event, Infallible> = Ok(Event::default()
                        .event("delta")
                        .json_data(serde_json::json!({ "content": content }))
                        .unwrap());
                    Some((event, (llm_stream, consumer)))
                }
                Ok(Some(Err(e))) => {
                    let message = e.to_string();
                    consumer.fail(message.clone());
                    let event: Result<Event, Infallible> = Ok(Event::default()
                        .event("error")
                        .json_data(serde_json::json!({ "message": message }))
                        .unwrap());
                    Some((event, (llm_stream, consumer)))
                }
                Ok(None) => {
                    tracing::debug!(chars = consumer.text().len(), "completion stream finished");
                    consumer.finish();
                    None
                }
                Err(_) => {
                    consumer.fail("idle timeout");
                    let event: Result<Event, Infallible> = Ok(Event::default()
                        .event("error")
                        .json_data(
                            serde_json::json!({ "message": "completion timed out (idle)" }),
                        )
                        .unwrap());
                    Some((event, (llm_stream, consumer)))
                }
            }
        },
    );

    let done_event: Result<Event, Infallible> = Ok(Event::default()
        .event("done")
        .json_data(serde_json::json!({}))
        .unwrap());

    delta_stream.chain(stream::once(async move { done_event }))
}

/// SSE `context` event carrying the source list shown alongside the answer.
pub(crate) fn context_event(sources: &[SourceRef]) -> Event {
    Event::default()
        .event("context")
        .json_data(serde_json::json!({ "sources": sources }))
        .unwrap()
}
