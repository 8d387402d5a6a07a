use herald_messenger::MessengerError;
use thiserror::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The Bot API answered with `ok: false`.
    #[error("telegram api rejected the request: {0}")]
    Api(String),

    /// Failed to build the HTTP client.
    #[error("failed to build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The request failed at the transport or HTTP level.
    #[error("telegram request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl MessengerError for Error {}
