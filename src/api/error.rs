use std::time::Duration;
use thiserror::Error;

/// Errors from Zendesk API interactions.
///
/// Every failure is local to the request that produced it; bulk operations
/// carry on past individual item failures.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad host URL or missing credentials. Raised before any network call.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network-level failure (connection, DNS, TLS, malformed body).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request exceeded the configured per-request deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The API answered with an error payload.
    #[error("API rejected the request ({status}): {message}")]
    Remote { status: u16, message: String },

    /// The API answered 2xx but the body did not match the expected shape.
    #[error("could not decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Fold a reqwest error into the taxonomy, surfacing deadline overruns
    /// as `Timeout` rather than a generic transport failure.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(timeout)
        } else {
            ApiError::Transport(err)
        }
    }
}
