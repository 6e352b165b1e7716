//! Error types for the API client.

use thiserror::Error;

/// Errors returned by the API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The endpoint URL scheme is neither HTTP nor WebSocket.
    #[error("bad api url scheme: {0}")]
    BadScheme(String),

    /// The endpoint URL failed to parse.
    #[error(transparent)]
    BadUrl(#[from] url::ParseError),

    /// The access token cannot be carried in an HTTP header.
    #[error("invalid access token")]
    InvalidToken,

    /// HTTP transport failure.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// WebSocket transport failure.
    #[error(transparent)]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),

    /// I/O failure while binding or serving.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Payload (de)serialization failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The gateway reported a non-ok status.
    #[error("api request failed: {status} {retcode}")]
    Api {
        /// Reported status string, e.g. `"failed"`.
        status: String,
        /// Gateway return code.
        retcode: i64,
    },

    /// No response arrived in time (WebSocket calls).
    #[error("request timeout")]
    Timeout,

    /// The connection is gone.
    #[error("not connected")]
    NotConnected,

    /// Codec failure while assembling a payload.
    #[error(transparent)]
    Codec(#[from] braze_cqcode::CodecError),
}

/// Result type for API client operations.
pub type ApiResult<T> = Result<T, ApiError>;
