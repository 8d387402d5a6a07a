use herald_store::StoreError;
use thiserror::Error;

/// Errors that can occur in this crate. In-memory operations cannot fail, so
/// this type is uninhabited.
#[derive(Debug, Error)]
pub enum Error {}

impl StoreError for Error {}
