use std::sync::Arc;

use crate::candidates::Catalog;
use crate::config::Config;
use crate::llm::embeddings::{Embedder, OpenAiEmbedder};
use crate::retrieval::{MemoryChunkStore, Retriever};

/// Shared application state. Everything here is either immutable after
/// startup or internally synchronized — handlers never reassign shared
/// handles; per-request provider choice goes through `select_provider`.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<Catalog>,
    pub store: Arc<MemoryChunkStore>,
    pub retriever: Arc<Retriever>,
    pub http_client: reqwest::Client,
    pub completion_semaphore: Arc<tokio::sync::Semaphore>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        let store = Arc::new(MemoryChunkStore::open_or_create(
            &config.corpus_path(),
            config.embedding.dim,
        )?);

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAiEmbedder::new(
            http_client.clone(),
            config.embedding.clone(),
        ));
        let retriever = Arc::new(Retriever::new(embedder, store.clone()));

        let max_concurrent = config.max_concurrent_completions;

        Ok(Self {
            config,
            catalog: Arc::new(Catalog::builtin()),
            store,
            retriever,
            http_client,
            completion_semaphore: Arc::new(tokio::sync::Semaphore::new(max_concurrent)),
        })
    }
}
