//! Errors raised by the Discord transports and notifier.

use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::StoreError;

/// Result alias for Discord operations.
pub type DiscordResult<T> = Result<T, DiscordError>;

/// Error raised by Discord message operations.
#[derive(Debug, Error)]
pub enum DiscordError {
    /// The configured webhook URL is not a Discord webhook.
    #[error("invalid webhook URL")]
    InvalidWebhookUrl,
    /// Building the HTTP client failed.
    #[error("building HTTP client: {0}")]
    ClientBuilder(#[source] reqwest::Error),
    /// Sending a request failed.
    #[error("sending {path}: {source}")]
    RequestSend {
        /// Request path (credentials elided).
        path: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The API answered with a non-success status.
    #[error("{path} returned {status}")]
    RequestStatus {
        /// Request path (credentials elided).
        path: String,
        /// HTTP status received.
        status: StatusCode,
    },
    /// Decoding a response body failed.
    #[error("decoding response from {path}: {source}")]
    DecodeResponse {
        /// Request path (credentials elided).
        path: String,
        /// Underlying decode error.
        #[source]
        source: reqwest::Error,
    },
    /// Persisting the message-id map failed.
    #[error("recording message id: {0}")]
    MapStore(#[from] StoreError),
}
