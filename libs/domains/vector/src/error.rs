use core_resilience::ErrorClassification;
use thiserror::Error;

use crate::models::ProviderTier;

#[derive(Debug, Error)]
pub enum VectorError {
    /// Structurally broken configuration. Raised while wiring, never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP {status} from {endpoint}: {message}")]
    Http {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider answered but the payload is unusable.
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Embedding service unavailable ({classification}): {message}")]
    EmbeddingServiceUnavailable {
        message: String,
        classification: ErrorClassification,
        last_tier: Option<ProviderTier>,
    },

    #[error("Collection '{0}' does not exist and collection creation is disabled")]
    CollectionMissing(String),

    #[error(
        "Collection '{collection}' vector '{vector_name}' has {actual} dimensions but the embedding provider produces {expected}; \
         recreate the collection (or restore the previous embedding model) before starting"
    )]
    DimensionMismatch {
        collection: String,
        vector_name: String,
        expected: u64,
        actual: u64,
    },

    #[error(
        "Collection '{collection}' is missing the {kind} vector '{vector_name}'; recreate the collection with the hybrid schema"
    )]
    MissingVector {
        collection: String,
        kind: &'static str,
        vector_name: String,
    },

    #[error(
        "Collection '{collection}' payload index '{field}' has type '{actual}' but '{expected}' is required; \
         migrate the index manually"
    )]
    PayloadIndexConflict {
        collection: String,
        field: String,
        expected: String,
        actual: String,
    },

    /// `operation` names the call that failed on every candidate, e.g.
    /// `inspect collection java-docs` or `readiness check`.
    #[error("Vector store unreachable during {operation} after trying {attempted:?}: {message}")]
    VectorStoreUnavailable {
        operation: String,
        attempted: Vec<String>,
        message: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type VectorResult<T> = Result<T, VectorError>;

impl VectorError {
    pub fn http(endpoint: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        VectorError::Http {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }

    /// Status code when the failure came from an HTTP response.
    pub fn status(&self) -> Option<u16> {
        match self {
            VectorError::Http { status, .. } => Some(*status),
            VectorError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn classification(&self) -> ErrorClassification {
        match self {
            VectorError::EmbeddingServiceUnavailable { classification, .. } => *classification,
            // The endpoint names collections and ports, so only the status and
            // the response body are looked at.
            VectorError::Http {
                status, message, ..
            } => ErrorClassification::from_status(*status)
                .unwrap_or_else(|| ErrorClassification::from_message(message)),
            VectorError::Transport(err) if err.is_connect() || err.is_timeout() => {
                ErrorClassification::ConnectionError
            }
            VectorError::Transport(err) => err
                .status()
                .and_then(|status| ErrorClassification::from_status(status.as_u16()))
                .unwrap_or_else(|| core_resilience::classify(self)),
            _ => core_resilience::classify(self),
        }
    }

    /// Whether retrying the same call could succeed.
    ///
    /// Typed signals (status codes, reqwest flags) are consulted first, then
    /// the message chain.
    pub fn is_transient(&self) -> bool {
        match self {
            VectorError::Config(_)
            | VectorError::CollectionMissing(_)
            | VectorError::DimensionMismatch { .. }
            | VectorError::MissingVector { .. }
            | VectorError::PayloadIndexConflict { .. }
            | VectorError::EmbeddingServiceUnavailable { .. }
            | VectorError::VectorStoreUnavailable { .. } => false,
            VectorError::Http { status, .. } => is_transient_status(*status),
            VectorError::Transport(err) => {
                if err.is_connect() || err.is_timeout() {
                    return true;
                }
                match err.status() {
                    Some(status) => is_transient_status(status.as_u16()),
                    None => core_resilience::is_transient(self),
                }
            }
            _ => core_resilience::is_transient(self),
        }
    }

    /// Schema and configuration failures must stop the process.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VectorError::Config(_)
                | VectorError::CollectionMissing(_)
                | VectorError::DimensionMismatch { .. }
                | VectorError::MissingVector { .. }
                | VectorError::PayloadIndexConflict { .. }
        )
    }
}

fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 425 | 429) || (500..600).contains(&status)
}

impl From<serde_json::Error> for VectorError {
    fn from(err: serde_json::Error) -> Self {
        VectorError::Internal(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_transience() {
        assert!(VectorError::http("/embeddings", 503, "").is_transient());
        assert!(VectorError::http("/embeddings", 500, "").is_transient());
        assert!(VectorError::http("/embeddings", 429, "slow down").is_transient());
        assert!(VectorError::http("/embeddings", 408, "").is_transient());
        assert!(!VectorError::http("/embeddings", 401, "").is_transient());
        assert!(!VectorError::http("/embeddings", 404, "").is_transient());
        assert!(!VectorError::http("/embeddings", 400, "bad input").is_transient());
    }

    #[test]
    fn test_http_classification_uses_status_in_message() {
        assert_eq!(
            VectorError::http("/embeddings", 401, "").classification(),
            ErrorClassification::Unauthorized
        );
        assert_eq!(
            VectorError::http("/embeddings", 429, "").classification(),
            ErrorClassification::RateLimited
        );
    }

    #[test]
    fn test_http_classification_ignores_endpoint_digits() {
        let err = VectorError::http("GET /collections/github-repo-4012", 503, "");
        assert_eq!(err.classification(), ErrorClassification::ServiceUnavailable);

        let err = VectorError::http("PUT /collections/java-404-docs", 401, "");
        assert_eq!(err.classification(), ErrorClassification::Unauthorized);

        let err = VectorError::http("POST http://localhost:4290/v1/embeddings", 400, "bad input");
        assert_eq!(err.classification(), ErrorClassification::Unknown);
    }

    #[test]
    fn test_http_classification_falls_back_to_body() {
        let err = VectorError::http("/embeddings", 400, "Too Many Requests for this key");
        assert_eq!(err.classification(), ErrorClassification::RateLimited);
    }

    #[test]
    fn test_schema_errors_are_fatal_and_not_transient() {
        let err = VectorError::DimensionMismatch {
            collection: "java-docs".to_string(),
            vector_name: "dense".to_string(),
            expected: 4096,
            actual: 3072,
        };
        assert!(err.is_fatal());
        assert!(!err.is_transient());

        let message = err.to_string();
        assert!(message.contains("3072"));
        assert!(message.contains("4096"));
        assert!(message.contains("recreate"));
    }

    #[test]
    fn test_unavailable_keeps_attached_classification() {
        let err = VectorError::EmbeddingServiceUnavailable {
            message: "all tiers failed".to_string(),
            classification: ErrorClassification::ConnectionError,
            last_tier: Some(ProviderTier::OpenAiDirect),
        };
        assert_eq!(err.classification(), ErrorClassification::ConnectionError);
        assert!(!err.is_transient());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_invalid_payload_is_not_transient() {
        let err = VectorError::Embedding("dimension mismatch: expected 4096 but received 512".into());
        assert!(!err.is_transient());
    }
}
