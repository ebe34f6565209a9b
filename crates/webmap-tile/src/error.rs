//! Tile error types.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use webmap_store::StoreError;

/// Errors raised while producing or caching tiles.
#[derive(Error, Debug)]
pub enum TileError {
    /// A chunk payload is not a valid encoded block.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The composite raster could not be encoded.
    #[error("Encode error: {0}")]
    Encode(String),

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The request was rejected before any work was done.
    #[error(transparent)]
    Request(#[from] webmap_core::Error),

    /// The computation ran past the read timeout; no partial tile is returned.
    #[error("Read deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// Failure of a computation shared by several concurrent callers.
    #[error(transparent)]
    CacheCompute(Arc<TileError>),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, TileError>;

impl TileError {
    /// The underlying error, looking through shared computation failures.
    #[must_use]
    pub fn unshared(&self) -> &Self {
        match self {
            Self::CacheCompute(inner) => inner.unshared(),
            other => other,
        }
    }
}
