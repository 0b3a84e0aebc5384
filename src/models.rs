use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A source text unit produced by the out-of-band ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    pub date_crawled: Option<DateTime<Utc>>,
    pub date_published: Option<DateTime<Utc>>,
}

/// Classification assigned to a chunk during ingestion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    DirectQuote,
    Paraphrase,
    Commentary,
    UsefulInformation,
    Other,
}

/// Smallest retrievable unit of ingested text. Belongs to exactly one
/// [`Document`]; immutable after ingestion and never deleted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    pub document_id: Uuid,
    /// Position within the parent document; defines sibling adjacency.
    pub index_in_doc: usize,
    pub content: String,
    pub topics: Vec<String>,
    #[serde(rename = "type")]
    pub chunk_type: ChunkType,
    /// Embedding in the store's single model space. Chunks never cross the
    /// HTTP boundary directly — responses use [`SourceRow`] / [`SourceRef`].
    pub embedding: Vec<f32>,
}

/// A chunk returned from nearest-neighbor retrieval, with its distance and
/// the optional joins requested via `RetrieveOptions`.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Parent document metadata, when `include_document` was set.
    pub document: Option<Document>,
    /// Up to ±5 index-adjacent siblings, when `include_surrounding` was set.
    /// Ordered by `index_in_doc`; never includes the chunk itself.
    pub surrounding: Vec<Chunk>,
    /// Cosine distance to the query vector (ascending = more relevant).
    pub distance: f32,
}

/// A single chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A source excerpt handed to the prompt assembler. All fields optional:
/// ingestion occasionally leaves titles or URLs blank and the assembler must
/// not invent them.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    pub title: Option<String>,
    pub url: Option<String>,
    pub content: Option<String>,
}

impl From<&ScoredChunk> for SourceRef {
    fn from(scored: &ScoredChunk) -> Self {
        Self {
            title: scored.document.as_ref().map(|d| d.title.clone()),
            url: scored.document.as_ref().map(|d| d.url.clone()),
            content: Some(scored.chunk.content.clone()),
        }
    }
}

/// A chunk joined with its document for the explore-sources table.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRow {
    pub id: Uuid,
    pub title: Option<String>,
    pub url: Option<String>,
    pub content: String,
    #[serde(rename = "type")]
    pub chunk_type: ChunkType,
    pub topics: Vec<String>,
}

// ─── Request / response shapes ───────────────────────────

/// POST /api/search request body.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_k")]
    pub k: usize,
    /// Free-text style instructions from the configuration modal.
    pub custom_instructions: Option<String>,
    /// Jurisdiction hint ("focus on information relevant to a voter in …").
    pub selected_state: Option<String>,
    /// Completion model override; the online marker routes to the alternate
    /// provider.
    pub model: Option<String>,
}

fn default_k() -> usize {
    10
}

/// POST /api/chat request body — the thin completion proxy.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
}

/// GET /api/candidates/{slug}/sources query parameters. `text` selects the
/// soft KNN search; `type`/`contains` refine the exact campaign-topic filter.
/// The two modes are mutually exclusive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesQuery {
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub chunk_type: Option<ChunkType>,
    pub contains: Option<String>,
}
