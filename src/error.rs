//! Error types for WikiVox.

use crate::wiki::SearchResult;
use thiserror::Error;

/// Library-level error type for WikiVox operations.
#[derive(Error, Debug)]
pub enum WikiVoxError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error for {url} after {attempts} attempt(s): {message}")]
    Network {
        url: String,
        attempts: u32,
        message: String,
        /// HTTP status when the server answered, `None` for transport failures.
        status: Option<u16>,
    },

    #[error("No article found for '{query}'")]
    NotFound { query: String },

    #[error("'{query}' matches {} articles; pick one and retry with its URL", candidates.len())]
    AmbiguousSelection {
        query: String,
        candidates: Vec<SearchResult>,
    },

    #[error("'{title}' is a disambiguation page listing {} articles", candidates.len())]
    Disambiguation {
        title: String,
        candidates: Vec<SearchResult>,
    },

    #[error("TTS server {server_url} unavailable (segment {segment}, {attempts} attempt(s)): {last_error}")]
    TtsUnavailable {
        server_url: String,
        segment: usize,
        attempts: u32,
        last_error: String,
    },

    #[error("Unexpected API response: {0}")]
    Api(String),

    #[error("Audio processing failed: {0}")]
    Audio(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl WikiVoxError {
    /// Build a network error from a reqwest failure.
    pub fn network(url: impl Into<String>, err: &reqwest::Error) -> Self {
        WikiVoxError::Network {
            url: url.into(),
            attempts: 1,
            message: err.to_string(),
            status: err.status().map(|s| s.as_u16()),
        }
    }

    /// Build a network error for a non-success HTTP status.
    pub fn http_status(url: impl Into<String>, status: reqwest::StatusCode, body: &str) -> Self {
        let snippet: String = body.chars().take(200).collect();
        WikiVoxError::Network {
            url: url.into(),
            attempts: 1,
            message: format!("HTTP {}: {}", status, snippet.trim()),
            status: Some(status.as_u16()),
        }
    }

    /// Whether retrying the same request may succeed.
    ///
    /// Transport failures, timeouts, 5xx and 429 responses are transient.
    /// Every other variant is terminal.
    pub fn is_transient(&self) -> bool {
        match self {
            WikiVoxError::Network { status: None, .. } => true,
            WikiVoxError::Network {
                status: Some(code), ..
            } => *code >= 500 || *code == 429,
            WikiVoxError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            _ => false,
        }
    }

    /// Record the number of attempts spent before this error was surfaced.
    pub fn with_attempts(self, total: u32) -> Self {
        match self {
            WikiVoxError::Network {
                url,
                message,
                status,
                ..
            } => WikiVoxError::Network {
                url,
                attempts: total,
                message,
                status,
            },
            other => other,
        }
    }

    /// Candidate articles carried by ambiguity errors, if any.
    pub fn candidates(&self) -> Option<&[SearchResult]> {
        match self {
            WikiVoxError::AmbiguousSelection { candidates, .. }
            | WikiVoxError::Disambiguation { candidates, .. } => Some(candidates),
            _ => None,
        }
    }
}

/// Result type alias for WikiVox operations.
pub type Result<T> = std::result::Result<T, WikiVoxError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn net(status: Option<u16>) -> WikiVoxError {
        WikiVoxError::Network {
            url: "https://en.wikipedia.org/w/api.php".into(),
            attempts: 1,
            message: "boom".into(),
            status,
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(net(None).is_transient());
        assert!(net(Some(503)).is_transient());
        assert!(net(Some(429)).is_transient());
        assert!(!net(Some(404)).is_transient());
        assert!(!WikiVoxError::NotFound { query: "x".into() }.is_transient());
        assert!(!WikiVoxError::InvalidInput("x".into()).is_transient());
    }

    #[test]
    fn test_with_attempts_updates_network_only() {
        match net(None).with_attempts(4) {
            WikiVoxError::Network { attempts, .. } => assert_eq!(attempts, 4),
            other => panic!("unexpected {other:?}"),
        }
        let nf = WikiVoxError::NotFound { query: "x".into() }.with_attempts(4);
        assert!(matches!(nf, WikiVoxError::NotFound { .. }));
    }
}
