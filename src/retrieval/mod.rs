//! Nearest-neighbor retrieval over the ingested chunk corpus.
//!
//! [`Retriever`] composes the embedding generator and the chunk store: a
//! text query is embedded exactly once and the resulting vector is handed to
//! the store's distance query. Both seams are traits so either side can be
//! stubbed in tests.

pub mod store;

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::llm::embeddings::Embedder;
use crate::models::ScoredChunk;

pub use store::{BrowseFilter, ChunkStore, MemoryChunkStore};

/// A retrieval query: free text, a precomputed embedding, or (invalidly)
/// neither. When both are supplied the explicit embedding wins and the text
/// is ignored.
#[derive(Debug, Clone, Default)]
pub struct RetrievalQuery {
    pub text: Option<String>,
    pub embedding: Option<Vec<f32>>,
}

impl RetrievalQuery {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            embedding: None,
        }
    }

    pub fn embedding(embedding: Vec<f32>) -> Self {
        Self {
            text: None,
            embedding: Some(embedding),
        }
    }
}

/// Per-query join and filter toggles, each independent of the others.
#[derive(Debug, Clone, Default)]
pub struct RetrieveOptions {
    /// Attach the parent document's title/URL to each hit.
    pub include_document: bool,
    /// Attach up to ±5 index-adjacent sibling chunks from the same document.
    pub include_surrounding: bool,
    /// Restrict hits to chunks carrying this topic tag.
    pub topic: Option<String>,
}

/// Embedding generation + nearest-neighbor lookup behind one call.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn ChunkStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn ChunkStore>) -> Self {
        Self { embedder, store }
    }

    /// Return the `k` chunks nearest to the query, ascending by distance.
    ///
    /// Supplying neither text nor an embedding fails with `InvalidQuery`
    /// before any embedding or store call is made.
    pub async fn retrieve(
        &self,
        query: &RetrievalQuery,
        k: usize,
        options: &RetrieveOptions,
    ) -> Result<Vec<ScoredChunk>> {
        let embedding = match (&query.embedding, &query.text) {
            (Some(embedding), _) => embedding.clone(),
            (None, Some(text)) => self.embedder.embed(text).await?,
            (None, None) => {
                return Err(Error::InvalidQuery(
                    "must provide either an embedding or text".to_string(),
                ))
            }
        };

        self.store.nearest(&embedding, k, options).await
    }
}
