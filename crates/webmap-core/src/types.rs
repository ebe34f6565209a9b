//! Identifier and payload types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coords::CellPos;

/// Opaque tenant identifier handed out by the auth service.
///
/// The store trusts it as given and never re-verifies it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(pub u64);

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage namespace a (server, dimension) pair resolves to.
///
/// Assigned once when the dimension is first referenced; never renamed or merged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceId(pub u64);

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ns{}", self.0)
    }
}

/// Metadata attached to a cell.
///
/// Carried verbatim: the store neither parses nor validates it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellMeta(pub String);

impl CellMeta {
    /// Borrow the raw metadata string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CellMeta {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CellMeta {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A single cell write in an upload batch.
///
/// `color` is the encoded pixel block exactly as submitted; decoding happens
/// on the read path.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellWrite {
    pub pos: CellPos,
    pub color: Vec<u8>,
    pub meta: CellMeta,
}

impl CellWrite {
    /// Create a new cell write
    pub fn new(pos: CellPos, color: impl Into<Vec<u8>>, meta: impl Into<CellMeta>) -> Self {
        Self {
            pos,
            color: color.into(),
            meta: meta.into(),
        }
    }
}

impl fmt::Debug for CellWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellWrite")
            .field("pos", &self.pos)
            .field("color", &format_args!("<{} bytes>", self.color.len()))
            .field("meta", &self.meta)
            .finish()
    }
}
