use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the ingested corpus (documents + chunks) is stored
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Embedding provider configuration
    pub embedding: EmbeddingConfig,
    /// Completion provider configuration (default + online-augmented)
    pub completion: CompletionConfig,
    /// Maximum concurrent completion streams
    pub max_concurrent_completions: usize,
}

/// Embedding endpoint settings. OpenAI-compatible: POST
/// `{base_url}/v1/embeddings` with `{model, input}` and bearer auth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Vector dimension of the embedding model. The store rejects vectors of
    /// any other dimension — one model space per corpus.
    pub dim: usize,
}

/// Two completion providers selected per request by the model field: the
/// default provider with a fixed model id, and the online-augmented provider
/// reached when the request names its marker model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub default_base_url: String,
    pub default_model: String,
    pub default_api_key: Option<String>,
    pub online_base_url: String,
    /// Requesting exactly this model routes to the online provider.
    pub online_model: String,
    pub online_api_key: Option<String>,
    pub max_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:9000".to_string(),
            embedding: EmbeddingConfig::default(),
            completion: CompletionConfig::default(),
            max_concurrent_completions: 3,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key: None,
            dim: 1536,
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            default_base_url: "https://api.openai.com".to_string(),
            default_model: "gpt-4-0125-preview".to_string(),
            default_api_key: None,
            online_base_url: "https://api.perplexity.ai".to_string(),
            online_model: "pplx-70b-online".to_string(),
            online_api_key: None,
            max_tokens: 4096,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("LETS_VOTE_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("LETS_VOTE_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.embedding.api_key = Some(key.clone());
            config.completion.default_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("PPLX_API_KEY") {
            config.completion.online_api_key = Some(key);
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            config.embedding.base_url = url.clone();
            config.completion.default_base_url = url;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        if let Ok(dim) = std::env::var("EMBEDDING_DIM") {
            if let Ok(d) = dim.parse() {
                config.embedding.dim = d;
            }
        }
        if let Ok(model) = std::env::var("COMPLETION_MODEL") {
            config.completion.default_model = model;
        }
        if let Ok(val) = std::env::var("LETS_VOTE_MAX_CONCURRENT_COMPLETIONS") {
            if let Ok(v) = val.parse() {
                config.max_concurrent_completions = v;
            }
        }

        config
    }

    /// Path of the persisted corpus written by the ingestion pipeline.
    pub fn corpus_path(&self) -> PathBuf {
        self.data_dir.join("corpus.json")
    }
}
