use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

use super::RetrieveOptions;
use crate::error::{Error, Result};
use crate::models::{Chunk, ChunkType, Document, ScoredChunk};

/// How many index-adjacent siblings to attach on each side of a hit.
const SURROUNDING_SPAN: usize = 5;

/// Exact-match filter for the explore-sources table: a campaign topic tag,
/// optionally narrowed by chunk classification and a content substring.
#[derive(Debug, Clone)]
pub struct BrowseFilter {
    pub topic: String,
    pub chunk_type: Option<ChunkType>,
    pub contains: Option<String>,
}

/// Repository interface over the chunk corpus, so the storage engine is
/// swappable without touching call sites.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// The `k` chunks nearest to `embedding` by cosine distance, ascending,
    /// with the joins requested in `options`.
    async fn nearest(
        &self,
        embedding: &[f32],
        k: usize,
        options: &RetrieveOptions,
    ) -> Result<Vec<ScoredChunk>>;

    /// Chunks matching the exact filter, joined with their documents, in
    /// ingestion order, capped at `limit`.
    async fn browse(
        &self,
        filter: &BrowseFilter,
        limit: usize,
    ) -> Result<Vec<(Chunk, Option<Document>)>>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CorpusData {
    documents: Vec<Document>,
    chunks: Vec<Chunk>,
}

/// In-memory chunk store with JSON disk persistence.
///
/// The corpus is written by the out-of-band ingestion pipeline and loaded
/// read-only at startup; this subsystem never deletes chunks. All vectors
/// live in a single embedding-model space of fixed dimension.
pub struct MemoryChunkStore {
    inner: RwLock<CorpusData>,
    dim: usize,
    persist_path: std::path::PathBuf,
}

impl MemoryChunkStore {
    pub fn open_or_create(corpus_path: &Path, dim: usize) -> Result<Self> {
        if let Some(parent) = corpus_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Retrieval(format!("failed to create data dir: {e}")))?;
        }

        let inner = if corpus_path.exists() {
            let data = std::fs::read_to_string(corpus_path)
                .map_err(|e| Error::Retrieval(format!("failed to read corpus: {e}")))?;
            serde_json::from_str(&data)
                .map_err(|e| Error::Retrieval(format!("corrupt corpus file: {e}")))?
        } else {
            CorpusData::default()
        };

        Ok(Self {
            inner: RwLock::new(inner),
            dim,
            persist_path: corpus_path.to_path_buf(),
        })
    }

    pub fn chunk_count(&self) -> usize {
        self.inner.read().chunks.len()
    }

    /// Ingestion-side write path: register a document.
    pub fn insert_document(&self, document: Document) -> Result<()> {
        let mut inner = self.inner.write();
        inner.documents.push(document);
        self.persist(&inner)
    }

    /// Ingestion-side write path: append chunks. Every embedding must match
    /// the store's dimension — one model space per corpus.
    pub fn insert_chunks(&self, chunks: Vec<Chunk>) -> Result<()> {
        for chunk in &chunks {
            if chunk.embedding.len() != self.dim {
                return Err(Error::Retrieval(format!(
                    "chunk {} embedding has dimension {}, store expects {}",
                    chunk.id,
                    chunk.embedding.len(),
                    self.dim
                )));
            }
        }

        let mut inner = self.inner.write();
        inner.chunks.extend(chunks);
        self.persist(&inner)
    }

    fn persist(&self, inner: &CorpusData) -> Result<()> {
        let data = serde_json::to_string(inner)
            .map_err(|e| Error::Retrieval(format!("failed to serialize corpus: {e}")))?;
        std::fs::write(&self.persist_path, data)
            .map_err(|e| Error::Retrieval(format!("failed to persist corpus: {e}")))
    }

    fn document_map(inner: &CorpusData) -> HashMap<Uuid, &Document> {
        inner.documents.iter().map(|d| (d.id, d)).collect()
    }

    /// Siblings of `chunk` within ±`SURROUNDING_SPAN` positions in the same
    /// document, ordered by index, the chunk itself excluded.
    fn surrounding_of(inner: &CorpusData, chunk: &Chunk) -> Vec<Chunk> {
        let mut siblings: Vec<Chunk> = inner
            .chunks
            .iter()
            .filter(|c| {
                c.document_id == chunk.document_id
                    && c.id != chunk.id
                    && c.index_in_doc.abs_diff(chunk.index_in_doc) <= SURROUNDING_SPAN
            })
            .cloned()
            .collect();
        siblings.sort_by_key(|c| c.index_in_doc);
        siblings
    }
}

#[async_trait]
impl ChunkStore for MemoryChunkStore {
    async fn nearest(
        &self,
        embedding: &[f32],
        k: usize,
        options: &RetrieveOptions,
    ) -> Result<Vec<ScoredChunk>> {
        if embedding.len() != self.dim {
            return Err(Error::InvalidQuery(format!(
                "query embedding has dimension {}, store expects {}",
                embedding.len(),
                self.dim
            )));
        }

        let inner = self.inner.read();

        let mut scored: Vec<(f32, &Chunk)> = inner
            .chunks
            .iter()
            .filter(|c| match &options.topic {
                Some(topic) => c.topics.iter().any(|t| t == topic),
                None => true,
            })
            .map(|c| (cosine_distance(embedding, &c.embedding), c))
            .collect();

        // Ascending distance; equal distances order by chunk id so results
        // are reproducible across runs.
        scored.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.id.cmp(&b.1.id))
        });
        scored.truncate(k);

        let documents = Self::document_map(&inner);

        Ok(scored
            .into_iter()
            .map(|(distance, chunk)| ScoredChunk {
                document: options
                    .include_document
                    .then(|| documents.get(&chunk.document_id).map(|d| (*d).clone()))
                    .flatten(),
                surrounding: if options.include_surrounding {
                    Self::surrounding_of(&inner, chunk)
                } else {
                    Vec::new()
                },
                chunk: chunk.clone(),
                distance,
            })
            .collect())
    }

    async fn browse(
        &self,
        filter: &BrowseFilter,
        limit: usize,
    ) -> Result<Vec<(Chunk, Option<Document>)>> {
        let inner = self.inner.read();
        let documents = Self::document_map(&inner);

        Ok(inner
            .chunks
            .iter()
            .filter(|c| c.topics.iter().any(|t| t == &filter.topic))
            .filter(|c| match filter.chunk_type {
                Some(chunk_type) => c.chunk_type == chunk_type,
                None => true,
            })
            .filter(|c| match &filter.contains {
                Some(needle) => c.content.contains(needle.as_str()),
                None => true,
            })
            .take(limit)
            .map(|c| {
                (
                    c.clone(),
                    documents.get(&c.document_id).map(|d| (*d).clone()),
                )
            })
            .collect())
    }
}

/// Cosine distance: 1 − cosine similarity, ascending = nearer. Matches the
/// `<=>` operator the original delegated to its store.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 1.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        1.0
    } else {
        1.0 - dot / denom
    }
}
