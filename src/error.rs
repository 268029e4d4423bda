//! Error types for the syncgate crate.

use thiserror::Error;

/// Result type alias using our error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the syncgate crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Host request failures (open/send). Re-raised unchanged to the
    /// original caller; a failing synchronous send still gets its drain
    /// scheduled before this propagates.
    #[error("Request error: {0}")]
    Request(String),

    /// An application handler failed while a signal was delivered or replayed.
    #[error("Handler error: {0}")]
    Handler(String),

    /// Cross-context message delivery failed at the host port.
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// The feature probe could not complete its check. Never surfaced to
    /// application code; probes translate this into "patch not required".
    #[error("Probe error: {0}")]
    Probe(String),
}

impl Error {
    /// Create a request error.
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request(message.into())
    }

    /// Create a handler error.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }

    /// Create a delivery error.
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery(message.into())
    }

    /// Create a probe error.
    pub fn probe(message: impl Into<String>) -> Self {
        Self::Probe(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_category_and_message() {
        assert_eq!(
            Error::request("connection refused").to_string(),
            "Request error: connection refused"
        );
        assert_eq!(
            Error::handler("listener failed").to_string(),
            "Handler error: listener failed"
        );
    }
}
