//! Integration tests for the retrieval-and-answer pipeline.
//!
//! These exercise the retriever, store, and prompt assembly end to end
//! without a live embedding or completion provider: the `Embedder` and
//! `ChunkStore` seams are stubbed where the test needs to observe calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use lets_vote::error::{Error, Result};
use lets_vote::llm::embeddings::Embedder;
use lets_vote::models::{Chunk, ChunkType, Document, ScoredChunk, SourceRef};
use lets_vote::prompt::build_conversation;
use lets_vote::retrieval::{
    BrowseFilter, ChunkStore, MemoryChunkStore, RetrievalQuery, RetrieveOptions, Retriever,
};

// ─── Stubs ───────────────────────────────────────────────

/// Embedder returning a fixed vector and counting invocations.
struct FixedEmbedder {
    vector: Vec<f32>,
    calls: AtomicUsize,
}

impl FixedEmbedder {
    fn new(vector: Vec<f32>) -> Arc<Self> {
        Arc::new(Self {
            vector,
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector.clone())
    }
}

/// Store that records every query vector it receives and returns nothing.
struct RecordingStore {
    queries: Mutex<Vec<Vec<f32>>>,
}

impl RecordingStore {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            queries: Mutex::new(Vec::new()),
        })
    }

    fn queries(&self) -> Vec<Vec<f32>> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl ChunkStore for RecordingStore {
    async fn nearest(
        &self,
        embedding: &[f32],
        _k: usize,
        _options: &RetrieveOptions,
    ) -> Result<Vec<ScoredChunk>> {
        self.queries.lock().push(embedding.to_vec());
        Ok(Vec::new())
    }

    async fn browse(
        &self,
        _filter: &BrowseFilter,
        _limit: usize,
    ) -> Result<Vec<(Chunk, Option<Document>)>> {
        Ok(Vec::new())
    }
}

// ─── Corpus helpers ──────────────────────────────────────

fn make_document(title: &str, url: &str) -> Document {
    Document {
        id: Uuid::new_v4(),
        title: title.to_string(),
        url: url.to_string(),
        author: None,
        date_crawled: None,
        date_published: None,
    }
}

fn make_chunk(doc: &Document, index: usize, content: &str, embedding: Vec<f32>) -> Chunk {
    Chunk {
        id: Uuid::new_v4(),
        document_id: doc.id,
        index_in_doc: index,
        content: content.to_string(),
        topics: vec!["Nikki Haley 2024 Presidential Campaign".to_string()],
        chunk_type: ChunkType::Paraphrase,
        embedding,
    }
}

/// A small corpus about one candidate, spread across two documents.
fn seed_store(dir: &std::path::Path) -> MemoryChunkStore {
    let store = MemoryChunkStore::open_or_create(&dir.join("corpus.json"), 3).unwrap();

    let speech = make_document("Primary speech", "https://example.com/speech");
    let interview = make_document("TV interview", "https://example.com/interview");
    store.insert_document(speech.clone()).unwrap();
    store.insert_document(interview.clone()).unwrap();

    store
        .insert_chunks(vec![
            make_chunk(&speech, 0, "opening remarks", vec![0.0, 1.0, 0.0]),
            make_chunk(&speech, 1, "abortion stance", vec![1.0, 0.0, 0.0]),
            make_chunk(&speech, 2, "closing remarks", vec![0.0, 0.9, 0.1]),
            make_chunk(&interview, 0, "economy remarks", vec![0.6, 0.6, 0.0]),
        ])
        .unwrap();

    store
}

// ─── Retriever contract ──────────────────────────────────

#[tokio::test]
async fn test_text_query_embeds_once_and_passes_vector_through() {
    let embedder = FixedEmbedder::new(vec![0.1, 0.2, 0.3]);
    let store = RecordingStore::new();
    let retriever = Retriever::new(embedder.clone(), store.clone());

    let hits = retriever
        .retrieve(
            &RetrievalQuery::text("abortion"),
            3,
            &RetrieveOptions::default(),
        )
        .await
        .unwrap();

    assert!(hits.is_empty());
    assert_eq!(embedder.call_count(), 1);
    // The generator's output reaches the distance query untouched.
    assert_eq!(store.queries(), vec![vec![0.1, 0.2, 0.3]]);
}

#[tokio::test]
async fn test_explicit_embedding_skips_the_generator() {
    let embedder = FixedEmbedder::new(vec![9.0, 9.0, 9.0]);
    let store = RecordingStore::new();
    let retriever = Retriever::new(embedder.clone(), store.clone());

    retriever
        .retrieve(
            &RetrievalQuery::embedding(vec![0.5, 0.5, 0.0]),
            3,
            &RetrieveOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(embedder.call_count(), 0);
    assert_eq!(store.queries(), vec![vec![0.5, 0.5, 0.0]]);
}

#[tokio::test]
async fn test_empty_query_fails_without_any_calls() {
    let embedder = FixedEmbedder::new(vec![0.1, 0.2, 0.3]);
    let store = RecordingStore::new();
    let retriever = Retriever::new(embedder.clone(), store.clone());

    let err = retriever
        .retrieve(&RetrievalQuery::default(), 3, &RetrieveOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidQuery(_)));
    assert_eq!(embedder.call_count(), 0);
    assert!(store.queries().is_empty());
}

// ─── End-to-end over the real store ──────────────────────

#[tokio::test]
async fn test_retrieval_orders_by_distance_and_joins_documents() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(seed_store(dir.path()));
    let embedder = FixedEmbedder::new(vec![1.0, 0.0, 0.0]);
    let retriever = Retriever::new(embedder, store);

    let options = RetrieveOptions {
        include_document: true,
        include_surrounding: true,
        topic: None,
    };
    let hits = retriever
        .retrieve(&RetrievalQuery::text("abortion"), 3, &options)
        .await
        .unwrap();

    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].chunk.content, "abortion stance");
    for pair in hits.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }

    // Document join attaches the parent's title/URL.
    let doc = hits[0].document.as_ref().unwrap();
    assert_eq!(doc.title, "Primary speech");

    // Surrounding siblings come from the same document only, self excluded.
    let sibling_indexes: Vec<usize> = hits[0]
        .surrounding
        .iter()
        .map(|c| c.index_in_doc)
        .collect();
    assert_eq!(sibling_indexes, vec![0, 2]);
}

#[tokio::test]
async fn test_retrieval_caps_results_at_k() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(seed_store(dir.path()));
    let embedder = FixedEmbedder::new(vec![1.0, 0.0, 0.0]);
    let retriever = Retriever::new(embedder, store);

    for k in [0usize, 1, 2, 10] {
        let hits = retriever
            .retrieve(
                &RetrievalQuery::text("anything"),
                k,
                &RetrieveOptions::default(),
            )
            .await
            .unwrap();
        assert!(hits.len() <= k);
    }
}

// ─── Prompt round-trip ───────────────────────────────────

/// Parse `Title: … URL: … Content: …` lines back out of a system message.
fn parse_source_lines(system: &str) -> Vec<(String, String)> {
    system
        .lines()
        .filter_map(|line| {
            let rest = line.strip_prefix("Title: ")?;
            let (title, rest) = rest.split_once(" URL: ")?;
            let (url, _content) = rest.split_once(" Content: ")?;
            Some((title.to_string(), url.to_string()))
        })
        .collect()
}

#[tokio::test]
async fn test_conversation_round_trips_source_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(seed_store(dir.path()));
    let embedder = FixedEmbedder::new(vec![1.0, 0.0, 0.0]);
    let retriever = Retriever::new(embedder, store);

    let options = RetrieveOptions {
        include_document: true,
        ..Default::default()
    };
    let hits = retriever
        .retrieve(&RetrievalQuery::text("stances"), 4, &options)
        .await
        .unwrap();

    let sources: Vec<SourceRef> = hits.iter().map(SourceRef::from).collect();
    let messages = build_conversation("What are her stances?", &sources, None, None);
    assert_eq!(messages.len(), 2);

    let parsed = parse_source_lines(&messages[0].content);
    assert_eq!(parsed.len(), sources.len());
    for (source, (title, url)) in sources.iter().zip(&parsed) {
        assert_eq!(source.title.as_deref().unwrap(), title);
        assert_eq!(source.url.as_deref().unwrap(), url);
    }
}
