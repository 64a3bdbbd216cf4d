//! Error types for chat-relay

use thiserror::Error;

/// Result type alias using chat-relay's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for chat-relay
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The completion service did not answer in time
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    /// The completion service refused the request (auth, quota, rate limit)
    #[error("Upstream rejected the request: {0}")]
    UpstreamRejected(String),

    /// The completion service answered with something we could not use
    #[error("Malformed upstream response: {0}")]
    UpstreamMalformedResponse(String),

    /// Any other non-success status from the completion service
    #[error("Upstream API error: {0}")]
    Upstream(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document index could not be loaded or queried
    #[error("Index error: {0}")]
    Index(String),

    /// The client connection went away
    #[error("Connection closed")]
    ConnectionClosed,

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if error came from the answer side of a turn.
    ///
    /// These are contained at the turn boundary and reported to the client
    /// as a single error frame.
    pub fn is_upstream(&self) -> bool {
        !matches!(self, Error::ConnectionClosed | Error::Config(_))
    }

    /// Check if error is a client-side disconnect
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Error::ConnectionClosed)
    }

    /// Map a reqwest failure onto the upstream taxonomy
    pub fn from_upstream(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::UpstreamTimeout(err.to_string())
        } else if err.is_decode() {
            Error::UpstreamMalformedResponse(err.to_string())
        } else {
            Error::Http(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_classification() {
        assert!(Error::UpstreamTimeout("slow".into()).is_upstream());
        assert!(Error::UpstreamRejected("quota".into()).is_upstream());
        assert!(Error::UpstreamMalformedResponse("bad".into()).is_upstream());
        assert!(Error::Internal("boom".into()).is_upstream());
        assert!(!Error::ConnectionClosed.is_upstream());
        assert!(Error::ConnectionClosed.is_disconnect());
    }
}
