use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

/// Converts free text into a fixed-length vector. A trait so the retriever
/// can be exercised with a stub that never touches the network.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Client for an OpenAI-compatible embedding endpoint.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    config: EmbeddingConfig,
}

impl OpenAiEmbedder {
    pub fn new(client: reqwest::Client, config: EmbeddingConfig) -> Self {
        Self { client, config }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    data: Vec<EmbedData>,
    /// Some failures come back 200 with an error payload instead.
    error: Option<UpstreamError>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct UpstreamError {
    message: String,
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    /// One outbound call per invocation, no caching, no retry. The first
    /// embedding vector of the response is the result.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/v1/embeddings", self.config.base_url);
        let api_key = self.config.api_key.as_deref().unwrap_or_default();

        let req = EmbedRequest {
            model: &self.config.model,
            input: text,
        };

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&req)
            .send()
            .await
            .map_err(|e| Error::EmbeddingProvider(format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::EmbeddingProvider(format!(
                "embedding API returned {status}: {body}"
            )));
        }

        let body: EmbedResponse = resp
            .json()
            .await
            .map_err(|e| Error::EmbeddingProvider(format!("malformed response: {e}")))?;

        if let Some(upstream) = body.error {
            return Err(Error::EmbeddingProvider(upstream.message));
        }

        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::EmbeddingProvider("no embedding returned".to_string()))
    }
}
