//! Error types for the brokerage client.

use serde::Deserialize;

/// Result type for brokerage operations.
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Errors that can occur when talking to the brokerage API.
///
/// There is no transient/permanent classification: every call is a
/// single round trip and failures surface to the caller as-is.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP request failed before a response was produced.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status.
    #[error("brokerage API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl BrokerError {
    /// Build an API error from a status code and response body,
    /// extracting the venue's message field when the body parses.
    pub fn from_response(status: u16, body: &str) -> Self {
        if let Ok(err) = serde_json::from_str::<ApiErrorBody>(body) {
            Self::Api {
                status,
                message: err.message,
            }
        } else {
            Self::Api {
                status,
                message: body.to_string(),
            }
        }
    }
}

/// Error body shape returned by the venue: `{"code": ..., "message": ...}`.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}
