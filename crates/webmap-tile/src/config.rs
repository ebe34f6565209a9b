//! Tile service configuration.

use std::time::Duration;

use image::Rgb;
use serde::Deserialize;
use webmap_core::constants::BACKGROUND;

/// Configuration for [`TileService`](crate::TileService).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TileServiceConfig {
    /// How long a composite tile is served from cache, in milliseconds.
    pub cache_ttl_ms: u64,
    /// Maximum number of cached tiles. 0 disables caching.
    pub cache_capacity: u64,
    /// Bound on one tile computation, in milliseconds.
    ///
    /// Soft: checked before each cell decode and between stages, so a slow
    /// storage scan runs to completion before the overrun is reported.
    pub read_timeout_ms: Option<u64>,
    /// Largest accepted footprint per axis, in chunk cells.
    pub max_region_chunks: u32,
    /// Fill color where no cell is stored.
    pub background: [u8; 3],
}

impl Default for TileServiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: 60_000,
            cache_capacity: 1024,
            read_timeout_ms: Some(10_000),
            max_region_chunks: 64,
            background: BACKGROUND,
        }
    }
}

impl TileServiceConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache time-to-live.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_ms = ttl.as_millis() as u64;
        self
    }

    /// Set the cache capacity in tiles.
    #[must_use]
    pub const fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Set or clear the read timeout.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout_ms = timeout.map(|t| t.as_millis() as u64);
        self
    }

    /// Set the per-axis footprint limit.
    #[must_use]
    pub const fn with_max_region_chunks(mut self, chunks: u32) -> Self {
        self.max_region_chunks = chunks;
        self
    }

    /// Set the background fill color.
    #[must_use]
    pub const fn with_background(mut self, background: [u8; 3]) -> Self {
        self.background = background;
        self
    }

    /// Cache time-to-live.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// Read timeout, if any.
    #[must_use]
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    /// Background fill as a pixel.
    #[must_use]
    pub const fn background_pixel(&self) -> Rgb<u8> {
        Rgb(self.background)
    }
}
