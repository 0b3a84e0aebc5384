use futures_util::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;

use crate::config::CompletionConfig;
use crate::error::{Error, Result};
use crate::models::ChatMessage;

pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A fully resolved provider target for one completion request. Built per
/// call by [`select_provider`] — there is no shared mutable client state to
/// reassign between requests.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderTarget {
    pub base_url: String,
    pub model: String,
    api_key: String,
}

/// Pick the provider for a requested model. The online marker model routes to
/// the alternate provider with the model name passed through; everything else
/// (including no request at all) goes to the default provider with its fixed
/// model id. A missing or empty credential fails here, before any network
/// call — an empty string is not a key.
pub fn select_provider(
    config: &CompletionConfig,
    requested_model: Option<&str>,
) -> Result<ProviderTarget> {
    if requested_model == Some(config.online_model.as_str()) {
        let api_key = require_key(config.online_api_key.as_deref(), "PPLX_API_KEY")?;
        Ok(ProviderTarget {
            base_url: config.online_base_url.clone(),
            model: config.online_model.clone(),
            api_key,
        })
    } else {
        let api_key = require_key(config.default_api_key.as_deref(), "OPENAI_API_KEY")?;
        Ok(ProviderTarget {
            base_url: config.default_base_url.clone(),
            model: config.default_model.clone(),
            api_key,
        })
    }
}

fn require_key(key: Option<&str>, name: &str) -> Result<String> {
    match key {
        Some(k) if !k.trim().is_empty() => Ok(k.to_string()),
        _ => Err(Error::Configuration(format!(
            "{name} is not set for the selected completion provider"
        ))),
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

/// Stream a chat completion from the resolved provider. Returns a stream of
/// content deltas in arrival order; provider and transport failures surface
/// as `CompletionProvider` errors with no retry and no fallback provider.
pub async fn stream_completion(
    client: &reqwest::Client,
    target: &ProviderTarget,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
) -> Result<CompletionStream> {
    let url = format!("{}/v1/chat/completions", target.base_url);

    let req = CompletionRequest {
        model: &target.model,
        messages: &messages,
        stream: true,
        max_tokens,
    };

    let resp = client
        .post(&url)
        .timeout(Duration::from_secs(300))
        .header("Authorization", format!("Bearer {}", target.api_key))
        .json(&req)
        .send()
        .await
        .map_err(|e| Error::CompletionProvider(format!("request failed: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::CompletionProvider(format!(
            "completion API returned {status}: {body}"
        )));
    }

    let stream = lines(resp.bytes_stream()).filter_map(|line_result| async move {
        match line_result {
            Ok(line) => parse_sse_line(&line),
            Err(e) => Some(Err(e)),
        }
    });

    Ok(Box::pin(stream))
}

/// Parse a single SSE line from the completion stream. Returns:
/// - Some(Ok(content)) for content deltas
/// - Some(Err(e)) for malformed chunks
/// - None to skip (non-data lines, [DONE], role-only or empty deltas)
fn parse_sse_line(line: &str) -> Option<Result<String>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let data = line.strip_prefix("data: ")?.trim();
    if data == "[DONE]" {
        return None;
    }

    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => {
            let content = chunk
                .choices
                .first()
                .and_then(|c| c.delta.content.clone())
                .unwrap_or_default();
            if content.is_empty() {
                return None;
            }
            Some(Ok(content))
        }
        Err(e) => Some(Err(Error::CompletionProvider(format!(
            "failed to parse stream chunk: {e}"
        )))),
    }
}

/// Convert the response byte stream into complete lines, buffering partial
/// reads across chunk boundaries.
fn lines(
    byte_stream: impl Stream<Item = reqwest::Result<bytes::Bytes>> + Send + 'static,
) -> impl Stream<Item = Result<String>> + Send {
    futures_util::stream::unfold(
        (Box::pin(byte_stream), String::new()),
        |(mut stream, mut buffer)| async move {
            loop {
                if let Some(newline_pos) = buffer.find('\n') {
                    let line = buffer[..newline_pos].to_string();
                    buffer = buffer[newline_pos + 1..].to_string();
                    if !line.trim().is_empty() {
                        return Some((Ok(line), (stream, buffer)));
                    }
                    continue;
                }

                match stream.next().await {
                    Some(Ok(bytes)) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                    }
                    Some(Err(e)) => {
                        return Some((
                            Err(Error::CompletionProvider(format!("stream read error: {e}"))),
                            (stream, buffer),
                        ));
                    }
                    None => {
                        if !buffer.trim().is_empty() {
                            let remaining = std::mem::take(&mut buffer);
                            return Some((Ok(remaining), (stream, buffer)));
                        }
                        return None;
                    }
                }
            }
        },
    )
}
