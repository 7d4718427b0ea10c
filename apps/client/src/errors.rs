#![allow(dead_code)]

use thiserror::Error;

/// Application-level error type for everything the client surfaces to the
/// user. Every variant is recoverable: the process stays interactive and
/// accepts new submissions after any of these.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Resolved locally, never reaches the network layer.
    #[error("{0}")]
    Validation(String),

    /// The request exceeded its timeout. Treated as evidence of a sleeping
    /// backend, not as a generic failure.
    #[error("the analysis service did not respond in time; it is waking up, please retry shortly")]
    Timeout,

    /// Explicit quota/rate-limit signal from the service.
    #[error("AI capacity is exhausted: {0}")]
    RateLimited(String),

    /// Any other non-success response. `message` is the server-provided
    /// message when one was present, otherwise a generic fallback.
    #[error("server error (status {status}): {message}")]
    Server { status: u16, message: String },

    /// Non-timeout transport failure (connect refused, DNS, TLS, ...).
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ClientError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ClientError::Validation(msg.into())
    }

    /// True when the failure points at a cold backend that a wake attempt
    /// could fix.
    pub fn is_wake_candidate(&self) -> bool {
        matches!(self, ClientError::Timeout)
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
