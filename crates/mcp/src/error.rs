//! Tool invocation errors.

use tradedesk_broker::BrokerError;

/// Failure modes of a tool invocation.
///
/// Every variant reaches the caller as the same `{"error": <message>}`
/// payload; the kinds exist so code and tests can branch without string
/// matching. A tool call never raises past the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The requested name is not in the catalog.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Missing or malformed required arguments.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Any remote failure: transport, auth, rate limit, rejected order.
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// The venue answered but the requested entry was absent.
    #[error("{0}")]
    NotFound(String),

    /// The venue sent a field this server could not coerce.
    #[error("malformed numeric field {field}: {value:?}")]
    Malformed { field: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tool_message_is_contractual() {
        let err = ToolError::UnknownTool("nonexistent_tool".to_string());
        assert_eq!(err.to_string(), "Unknown tool: nonexistent_tool");
    }

    #[test]
    fn test_broker_errors_pass_through() {
        let err = ToolError::from(BrokerError::Api {
            status: 429,
            message: "rate limit exceeded".to_string(),
        });
        assert!(err.to_string().contains("rate limit exceeded"));
    }
}
