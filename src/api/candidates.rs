use std::convert::Infallible;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::Json;
use futures_util::stream::{self, Stream, StreamExt};
use serde::Serialize;

use crate::api::{completion_events, context_event, dedup_sources, degrade_to_empty, reject};
use crate::candidates::{Candidate, Race, TRACKED_ISSUES};
use crate::error::Error;
use crate::llm::chat_stream::{select_provider, stream_completion};
use crate::models::{Chunk, Document, SourceRef, SourceRow, SourcesQuery};
use crate::prompt::build_conversation;
use crate::retrieval::{BrowseFilter, ChunkStore, RetrievalQuery, RetrieveOptions};
use crate::state::AppState;

/// How many chunks feed an issue-tracker answer.
const ISSUE_CONTEXT_CHUNKS: usize = 30;
/// Row cap for the explore-sources table.
const SOURCES_LIMIT: usize = 25;

#[derive(Serialize)]
pub struct CatalogResponse {
    pub races: Vec<Race>,
    pub candidates: Vec<Candidate>,
}

/// GET /api/candidates — the full static catalog.
pub async fn list_candidates(State(state): State<AppState>) -> Json<CatalogResponse> {
    Json(CatalogResponse {
        races: state.catalog.races().to_vec(),
        candidates: state.catalog.candidates().to_vec(),
    })
}

#[derive(Serialize)]
pub struct CandidateDetail {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub issues: Vec<String>,
}

/// GET /api/candidates/{slug} — candidate card data plus the tracked issues.
pub async fn get_candidate(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CandidateDetail>, (StatusCode, String)> {
    let candidate = state.catalog.candidate_by_slug(&slug).map_err(reject)?;
    Ok(Json(CandidateDetail {
        candidate: candidate.clone(),
        issues: TRACKED_ISSUES.iter().map(|s| s.to_string()).collect(),
    }))
}

/// GET /api/candidates/{slug}/sources — the explore-sources table.
///
/// `?text=` runs a soft KNN search; otherwise the exact campaign-topic
/// filter applies, optionally narrowed by `?type=` and `?contains=`. The
/// modes are mutually exclusive — mixing them is an invalid query rather
/// than the silent precedence the interface used to have.
pub async fn candidate_sources(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<SourcesQuery>,
) -> Result<Json<Vec<SourceRow>>, (StatusCode, String)> {
    let candidate = state.catalog.candidate_by_slug(&slug).map_err(reject)?;

    if params.text.is_some() && (params.chunk_type.is_some() || params.contains.is_some()) {
        return Err(reject(Error::InvalidQuery(
            "text search cannot be combined with type/contains filters".to_string(),
        )));
    }

    let rows = match params.text {
        Some(text) => {
            let options = RetrieveOptions {
                include_document: true,
                ..Default::default()
            };
            state
                .retriever
                .retrieve(&RetrievalQuery::text(text), SOURCES_LIMIT, &options)
                .await
                .map_err(reject)?
                .into_iter()
                .map(|hit| source_row(hit.chunk, hit.document))
                .collect()
        }
        None => {
            let filter = BrowseFilter {
                topic: candidate.campaign_topic(),
                chunk_type: params.chunk_type,
                contains: params.contains,
            };
            state
                .store
                .browse(&filter, SOURCES_LIMIT)
                .await
                .map_err(reject)?
                .into_iter()
                .map(|(chunk, document)| source_row(chunk, document))
                .collect()
        }
    };

    Ok(Json(rows))
}

/// GET /api/candidates/{slug}/issues/{issue} — the issue tracker: retrieve
/// sources for the candidate's stance and stream a short cited answer.
/// Retrieval failure degrades to an empty source list so the page still
/// renders an answer shell.
pub async fn candidate_issue(
    State(state): State<AppState>,
    Path((slug, issue)): Path<(String, String)>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    let candidate = state.catalog.candidate_by_slug(&slug).map_err(reject)?.clone();

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

    let options = RetrieveOptions {
        include_document: true,
        ..Default::default()
    };
    let retrieval_query = format!("{} views on {}", candidate.name, issue);
    let hits = degrade_to_empty(
        state
            .retriever
            .retrieve(
                &RetrievalQuery::text(retrieval_query),
                ISSUE_CONTEXT_CHUNKS,
                &options,
            )
            .await,
        "issue tracker",
    );

    let sources: Vec<SourceRef> = hits.iter().map(SourceRef::from).collect();
    let display_sources = dedup_sources(&sources);

    let question = format!(
        "In 30 words or fewer, what is {}'s stance on {}?",
        candidate.name, issue
    );
    let messages = build_conversation(&question, &sources, None, None);

    let target = select_provider(&state.config.completion, None).map_err(reject)?;
    let llm_stream = stream_completion(
        &state.http_client,
        &target,
        messages,
        state.config.completion.max_tokens,
    )
    .await
    .map_err(reject)?;

    let context = context_event(&display_sources);
    let events = stream::once(async move { Ok(context) })
        .chain(completion_events(llm_stream))
        .map(move |event| {
            let _permit = &_permit;
            event
        });

    Ok(Sse::new(events))
}

fn source_row(chunk: Chunk, document: Option<Document>) -> SourceRow {
    SourceRow {
        id: chunk.id,
        title: document.as_ref().map(|d| d.title.clone()),
        url: document.as_ref().map(|d| d.url.clone()),
        content: chunk.content,
        chunk_type: chunk.chunk_type,
        topics: chunk.topics,
    }
}
