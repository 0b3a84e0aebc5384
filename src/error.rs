use axum::http::StatusCode;
use thiserror::Error;

/// Result type used throughout the retrieval and completion flow.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the retrieval-augmented answer pipeline.
///
/// Every variant propagates to the caller unmodified — no component retries
/// or silently falls back. The only sanctioned recovery is the issue-tracker
/// degrade to an empty source list, which lives at the handler layer.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller supplied neither text nor an embedding, or an otherwise
    /// malformed search request.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The upstream embedding call failed (HTTP error or error payload).
    #[error("embedding provider error: {0}")]
    EmbeddingProvider(String),

    /// The upstream completion call failed.
    #[error("completion provider error: {0}")]
    CompletionProvider(String),

    /// The chunk store rejected or failed a query.
    #[error("retrieval error: {0}")]
    Retrieval(String),

    /// Unknown candidate slug.
    #[error("not found: {0}")]
    NotFound(String),

    /// A credential or setting required for the selected provider is missing.
    /// Raised before any network call is made.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Map onto the HTTP status used by every handler.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::EmbeddingProvider(_) | Error::CompletionProvider(_) => StatusCode::BAD_GATEWAY,
            Error::Retrieval(_) | Error::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The `(status, message)` rejection shape axum handlers return.
    pub fn into_response_parts(self) -> (StatusCode, String) {
        (self.status(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_query_maps_to_400() {
        let err = Error::InvalidQuery("neither text nor embedding".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(Error::NotFound("no-such-slug".into()).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_provider_errors_map_to_502() {
        assert_eq!(
            Error::EmbeddingProvider("upstream".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            Error::CompletionProvider("upstream".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_configuration_maps_to_500() {
        assert_eq!(
            Error::Configuration("missing key".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_display_carries_upstream_message() {
        let err = Error::EmbeddingProvider("model not found".into());
        assert_eq!(err.to_string(), "embedding provider error: model not found");
    }
}
