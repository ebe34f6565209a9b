//! Durable chunk storage for webmap.
//!
//! A single `redb` database holds every namespace. Dimensions are registered
//! under a `{server}/{dimension}` key and resolve to a [`NamespaceId`]; chunk
//! cells of all namespaces share one table keyed by the composite
//! `(namespace, y, x, z)` tuple, so a region scan is a range over the key
//! prefix instead of a per-dimension table.
//!
//! Components reach the database through the [`NamespaceResolver`] and
//! [`ChunkRepository`] traits, which [`ChunkDb`] implements.

mod db;
pub mod error;
mod memo;
pub mod repository;
pub mod resolver;
mod tables;

pub use db::ChunkDb;
pub use error::{Result, StoreError};
pub use repository::{CellScan, ChunkRepository, ScannedCell, StoredCell};
pub use resolver::NamespaceResolver;

pub use webmap_core::{CellPos, NamespaceId, Region, ServerId};
