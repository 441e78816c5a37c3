use crate::catalog::CatalogError;
use crate::storage::error::StorageError;
use thiserror::Error;

/// Errors raised by the typed access layer.
#[derive(Error, Debug)]
pub enum AccessError {
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    #[error("record has not been persisted and carries no record id")]
    RecordNotPersisted,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub type AccessResult<T> = Result<T, AccessError>;
