//! Error classification over `std::error::Error` source chains.
//!
//! Classification is message based because the interesting signal (status
//! codes, transport wording) usually sits a few levels below the error the
//! caller actually holds.

use std::error::Error;
use std::fmt;

/// Markers anywhere in the chain that indicate a retryable outage.
const TRANSIENT_MARKERS: &[&str] = &[
    "unavailable",
    "deadline exceeded",
    "resource exhausted",
    "timed out",
    "internal server error",
    "bad gateway",
];

/// Tokens that, when followed by a 5xx code, identify a server-side failure.
const STATUS_PREFIXES: &[&str] = &["http", "status", "code"];

/// Coarse label for a failure, derived from its full cause chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClassification {
    NotFound,
    Unauthorized,
    Forbidden,
    RateLimited,
    ConnectionError,
    /// 5xx or 408 from an upstream server
    ServiceUnavailable,
    EmbeddingServiceUnavailable,
    Unknown,
}

impl ErrorClassification {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorClassification::NotFound => "404 Not Found",
            ErrorClassification::Unauthorized => "401 Unauthorized",
            ErrorClassification::Forbidden => "403 Forbidden",
            ErrorClassification::RateLimited => "429 Rate Limited",
            ErrorClassification::ConnectionError => "Connection Error",
            ErrorClassification::ServiceUnavailable => "Service Unavailable",
            ErrorClassification::EmbeddingServiceUnavailable => "Embedding Service Unavailable",
            ErrorClassification::Unknown => "Unknown Error",
        }
    }

    /// Classification implied by an HTTP status code alone.
    ///
    /// `None` for statuses that carry no retry or auth meaning (400, 422, ...).
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            401 => Some(ErrorClassification::Unauthorized),
            403 => Some(ErrorClassification::Forbidden),
            404 => Some(ErrorClassification::NotFound),
            429 => Some(ErrorClassification::RateLimited),
            408 | 500..=599 => Some(ErrorClassification::ServiceUnavailable),
            _ => None,
        }
    }

    /// Classify an already-lowercased, chain-joined message.
    ///
    /// Patterns are checked in priority order, so a message mentioning both
    /// "404" and "connection" is a `NotFound`.
    pub fn from_message(message: &str) -> Self {
        let message = message.to_lowercase();
        let has = |needle: &str| message.contains(needle);

        if has("404") || has("not found") {
            ErrorClassification::NotFound
        } else if has("401") || has("unauthorized") {
            ErrorClassification::Unauthorized
        } else if has("403") || has("forbidden") {
            ErrorClassification::Forbidden
        } else if has("429") || has("too many requests") {
            ErrorClassification::RateLimited
        } else if has("connection") || has("timeout") {
            ErrorClassification::ConnectionError
        } else if has("embedding") && has("unavailable") {
            ErrorClassification::EmbeddingServiceUnavailable
        } else {
            ErrorClassification::Unknown
        }
    }

    /// Connection failures and rate limits clear up on their own.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorClassification::ConnectionError
                | ErrorClassification::ServiceUnavailable
                | ErrorClassification::RateLimited
        )
    }
}

impl fmt::Display for ErrorClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Iterate an error and all of its sources, outermost first.
pub fn error_chain<'a>(
    error: &'a (dyn Error + 'static),
) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
    std::iter::successors(Some(error), |&current| current.source())
}

/// Join every non-blank message in the chain, lowercased, separated by spaces.
pub fn chain_message(error: &(dyn Error + 'static)) -> String {
    error_chain(error)
        .map(|link| link.to_string())
        .filter(|message| !message.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn classify(error: &(dyn Error + 'static)) -> ErrorClassification {
    ErrorClassification::from_message(&chain_message(error))
}

/// Decide whether `error` is worth retrying.
///
/// A malformed identifier anywhere in the chain is a caller bug and wins
/// over every other signal. Unknown failures default to non-transient.
pub fn is_transient(error: &(dyn Error + 'static)) -> bool {
    if is_malformed_identifier(error) {
        return false;
    }

    if classify(error).is_transient() {
        return true;
    }

    let message = chain_message(error);
    TRANSIENT_MARKERS.iter().any(|marker| message.contains(marker))
        || mentions_server_error_status(&message)
}

/// True when any link is a UUID parse failure or talks about a UUID.
pub fn is_malformed_identifier(error: &(dyn Error + 'static)) -> bool {
    error_chain(error).any(|link| {
        link.downcast_ref::<uuid::Error>().is_some()
            || link.to_string().to_lowercase().contains("uuid")
    })
}

/// Looks for "http 503", "status: 502", "code=500" style fragments.
///
/// A bare three digit number is not enough: "expected 4096 but received 512"
/// must not read as a server error.
fn mentions_server_error_status(message: &str) -> bool {
    let tokens: Vec<&str> = message
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();

    tokens.windows(2).any(|pair| {
        STATUS_PREFIXES.contains(&pair[0]) && is_server_error_code(pair[1])
    })
}

fn is_server_error_code(token: &str) -> bool {
    token.len() == 3 && token.starts_with('5') && token.bytes().all(|b| b.is_ascii_digit())
}
