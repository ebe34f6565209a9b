//! Error types shared by all webmap crates.

use thiserror::Error;

/// Errors raised while validating inputs to the core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A tile request that cannot be served as asked
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
