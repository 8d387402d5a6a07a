use thiserror::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate. Callers cannot distinguish rejected
/// credentials from an unreachable server; both are retried on the next
/// scheduled attempt.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to build the HTTP client.
    #[error("failed to build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The login response did not contain an access token.
    #[error("login response missing access token")]
    MissingToken,

    /// The credential exchange failed at the transport or HTTP level.
    #[error("login request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered the login mutation with GraphQL errors.
    #[error("login rejected: {0}")]
    Rejected(String),
}
