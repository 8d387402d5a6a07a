use thiserror::Error;

/// Errors surfaced while persisting or recovering ledger state. Always
/// observational: callers log these and carry on with the in-memory state.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The state snapshot could not be serialized.
    #[error("state serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The underlying store rejected the write.
    #[error("state store failed: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}
