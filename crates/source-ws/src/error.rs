use herald_source::SourceError;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::protocol::mentions_unauthorized;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The server never acknowledged the protocol handshake.
    #[error("timed out waiting for connection acknowledgement")]
    AckTimeout,

    /// The connection closed before the handshake finished.
    #[error("connection closed during handshake")]
    HandshakeClosed,

    /// The bearer token cannot be carried in an HTTP header.
    #[error("bearer token is not a valid header value")]
    InvalidToken,

    /// A server frame could not be parsed.
    #[error("malformed server message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The server terminated the subscription with an error payload.
    #[error("subscription error: {message}")]
    Subscription {
        /// The raw error payload, rendered as JSON.
        message: String,
        /// Whether the payload carried the server's unauthorized marker.
        unauthorized: bool,
    },

    /// The underlying WebSocket failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
}

impl Error {
    pub(crate) fn subscription(payload: &serde_json::Value) -> Self {
        Self::Subscription {
            message: payload.to_string(),
            unauthorized: mentions_unauthorized(payload),
        }
    }
}

impl SourceError for Error {
    fn is_unauthorized(&self) -> bool {
        match self {
            Self::Subscription { unauthorized, .. } => *unauthorized,
            Self::WebSocket(tungstenite::Error::Http(response)) => {
                response.status() == tungstenite::http::StatusCode::UNAUTHORIZED
            }
            _ => false,
        }
    }
}
