//! Composite tile cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use moka::Expiry;
use webmap_core::TileRequest;

use crate::error::{Result, TileError};

/// Memoizes encoded tiles per request.
///
/// Writes never invalidate entries: a tile may be up to `ttl` old. A shared
/// cache for multi-process deployments implements this same contract and
/// must keep that staleness rather than invalidate on write.
pub trait TileCache: Send + Sync {
    /// Return the unexpired entry for `key`, or run `compute` and store its
    /// result for `ttl`. Failures are returned to the caller and never stored.
    fn get_or_compute(
        &self,
        key: &TileRequest,
        ttl: Duration,
        compute: &mut dyn FnMut() -> Result<Bytes>,
    ) -> Result<Bytes>;
}

#[derive(Clone)]
struct CachedTile {
    bytes: Bytes,
    ttl: Duration,
}

// entries live for the ttl they were created with; reads do not extend it
struct CreationTtl;

impl Expiry<TileRequest, CachedTile> for CreationTtl {
    fn expire_after_create(
        &self,
        _key: &TileRequest,
        value: &CachedTile,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Process-local cache bounded by entry count with LRU eviction.
///
/// Concurrent misses on the same key run `compute` once; the other callers
/// wait for and share its result.
pub struct MemoryTileCache {
    cache: Cache<TileRequest, CachedTile>,
}

impl MemoryTileCache {
    /// Create a cache holding at most `capacity` tiles.
    pub fn new(capacity: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(capacity)
                .eviction_policy(EvictionPolicy::lru())
                .expire_after(CreationTtl)
                .build(),
        }
    }

    /// Approximate number of live entries.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl TileCache for MemoryTileCache {
    fn get_or_compute(
        &self,
        key: &TileRequest,
        ttl: Duration,
        compute: &mut dyn FnMut() -> Result<Bytes>,
    ) -> Result<Bytes> {
        self.cache
            .try_get_with_by_ref(key, || compute().map(|bytes| CachedTile { bytes, ttl }))
            .map(|tile| tile.bytes)
            .map_err(|err| Arc::try_unwrap(err).unwrap_or_else(TileError::CacheCompute))
    }
}

/// Cache that stores nothing and computes every time.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughCache;

impl TileCache for PassthroughCache {
    fn get_or_compute(
        &self,
        _key: &TileRequest,
        _ttl: Duration,
        compute: &mut dyn FnMut() -> Result<Bytes>,
    ) -> Result<Bytes> {
        compute()
    }
}
