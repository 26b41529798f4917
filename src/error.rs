//! Crate-level error type.
//!
//! Client operations never surface these to the user; they are returned by the
//! history source, the transport and config loading, and otherwise logged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// The remote server replied with a non-2xx HTTP status code.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// A TCP-level connection could not be established or the request failed in flight.
    #[error("request to {url} failed: {detail}")]
    Connect { url: String, detail: String },

    /// A frame or response body could not be decoded.
    #[error("could not decode {what}: {detail}")]
    Decode { what: &'static str, detail: String },

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ChatError {
    pub(crate) fn decode(what: &'static str, err: impl std::fmt::Display) -> Self {
        ChatError::Decode {
            what,
            detail: err.to_string(),
        }
    }
}
