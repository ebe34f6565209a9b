//! Storage error types.

use thiserror::Error;
use webmap_core::NamespaceId;

/// Storage-related errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Scan or write against a namespace that was never provisioned.
    #[error("Unknown namespace: {0}")]
    UnknownNamespace(NamespaceId),

    /// Underlying database failure.
    #[error("Storage error: {0}")]
    Storage(#[from] redb::Error),

    /// A cell record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The registry is in a state it should never reach.
    #[error("Corrupt registry: {0}")]
    Corrupt(String),
}

macro_rules! storage_from {
    ($($err:ty),* $(,)?) => {
        $(
            impl From<$err> for StoreError {
                fn from(err: $err) -> Self {
                    Self::Storage(err.into())
                }
            }
        )*
    };
}

storage_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, StoreError>;
