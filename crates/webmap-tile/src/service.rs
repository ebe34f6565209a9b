//! Write and read paths over a chunk store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use rayon::prelude::*;
use tracing::{debug, warn};
use webmap_core::{CellWrite, ServerId, TileRequest};
use webmap_store::{ChunkRepository, NamespaceResolver, ScannedCell, StoreError};

use crate::cache::{MemoryTileCache, PassthroughCache, TileCache};
use crate::codec::{decode_block, encode_tile};
use crate::compositor::{composite, DecodedCell};
use crate::config::TileServiceConfig;
use crate::error::{Result, TileError};

/// Latest instant a computation may still make progress.
///
/// The bound is soft: a storage scan in progress is not interrupted. It is
/// checked before each cell decode and between stages.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    fn passed(deadline: Option<Self>) -> bool {
        deadline.is_some_and(|d| Instant::now() > d.at)
    }

    fn check(deadline: Option<Self>, stage: &str) -> Result<()> {
        match deadline {
            Some(d) if Instant::now() > d.at => {
                warn!(stage, budget = ?d.budget, "tile computation exceeded read deadline");
                Err(TileError::DeadlineExceeded(d.budget))
            }
            _ => Ok(()),
        }
    }
}

/// Chunk store front end: accepts cell uploads and serves composite tiles.
///
/// The store is injected at construction so tests can substitute fakes.
pub struct TileService<S> {
    store: Arc<S>,
    cache: Arc<dyn TileCache>,
    config: TileServiceConfig,
}

impl<S> TileService<S>
where
    S: NamespaceResolver + ChunkRepository,
{
    /// Create a service with a process-local cache sized by `config`.
    pub fn new(store: Arc<S>, config: TileServiceConfig) -> Self {
        let cache: Arc<dyn TileCache> = if config.cache_capacity == 0 {
            Arc::new(PassthroughCache)
        } else {
            Arc::new(MemoryTileCache::new(config.cache_capacity))
        };
        Self::with_cache(store, cache, config)
    }

    /// Create a service with an externally provided cache.
    pub fn with_cache(store: Arc<S>, cache: Arc<dyn TileCache>, config: TileServiceConfig) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    /// The underlying store.
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Active configuration.
    pub const fn config(&self) -> &TileServiceConfig {
        &self.config
    }

    /// Upsert a batch of cells into a dimension, creating it if needed.
    ///
    /// Cached tiles covering these cells are left alone and go stale until
    /// their entries expire.
    pub fn write_cells(&self, server: ServerId, dimension: &str, cells: &[CellWrite]) -> Result<()> {
        let namespace = self.store.resolve_namespace(server, dimension)?;
        self.store.ensure_namespace_storage(namespace)?;
        self.store.upsert_cells(namespace, cells)?;
        debug!(%server, dimension, %namespace, cells = cells.len(), "wrote cells");
        Ok(())
    }

    /// Encoded PNG tile for a request, served from cache when fresh.
    pub fn render_tile(&self, request: &TileRequest) -> Result<Bytes> {
        request.validate(self.config.max_region_chunks)?;
        let deadline = self.deadline();
        self.cache
            .get_or_compute(request, self.config.cache_ttl(), &mut || {
                self.compute_tile(request, deadline)
            })
    }

    /// Render a tile without consulting or filling the cache.
    pub fn render_uncached(&self, request: &TileRequest) -> Result<Bytes> {
        request.validate(self.config.max_region_chunks)?;
        self.compute_tile(request, self.deadline())
    }

    fn deadline(&self) -> Option<Deadline> {
        self.config.read_timeout().map(|budget| Deadline {
            at: Instant::now() + budget,
            budget,
        })
    }

    fn compute_tile(&self, request: &TileRequest, deadline: Option<Deadline>) -> Result<Bytes> {
        let namespace = self
            .store
            .resolve_namespace(request.server, &request.dimension)?;
        self.store.ensure_namespace_storage(namespace)?;

        let region = request.region();
        let scanned: Vec<ScannedCell> = match self.store.scan_range(namespace, &region) {
            Ok(scan) => scan.collect(),
            Err(StoreError::UnknownNamespace(_)) => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        Deadline::check(deadline, "scan")?;

        let decoded: Vec<DecodedCell> = scanned
            .into_par_iter()
            .filter_map(|cell| {
                if Deadline::passed(deadline) {
                    return None;
                }
                match decode_block(&cell.color) {
                    Ok(block) => Some(DecodedCell {
                        x: cell.x,
                        z: cell.z,
                        block,
                    }),
                    Err(err) => {
                        warn!(
                            %namespace,
                            x = cell.x,
                            z = cell.z,
                            error = %err,
                            "skipping undecodable cell"
                        );
                        None
                    }
                }
            })
            .collect();
        Deadline::check(deadline, "decode")?;

        let raster = composite(
            &decoded,
            &region,
            request.scale,
            self.config.background_pixel(),
        );
        Deadline::check(deadline, "composite")?;

        let bytes = encode_tile(&raster)?;
        debug!(
            %namespace,
            ?region,
            scale = request.scale,
            cells = decoded.len(),
            bytes = bytes.len(),
            "composited tile"
        );
        Ok(bytes)
    }
}

impl<S> Clone for TileService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            config: self.config.clone(),
        }
    }
}
