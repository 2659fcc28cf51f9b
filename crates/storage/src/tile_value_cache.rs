//! Retained sample grids for value-under-cursor queries.
//!
//! Every colorized tile's grid is kept here so that a later query for a map
//! coordinate can return the raw sample rather than a color.
//!
//! ## Keys
//!
//! Grids are keyed by tile column and row. Zoom is left out unless the cache
//! is built with `key_includes_zoom`, so by default a tile at one zoom
//! replaces a tile at another zoom with the same `(x, y)`.
//!
//! ## Eviction
//!
//! Unbounded by default. `EvictionPolicy::MaxTiles` and
//! `EvictionPolicy::MaxBytes` bound the cache and evict least recently used
//! grids first.
//!
//! ## Consistency
//!
//! Grids are stored behind `Arc` and swapped whole under the write lock, so a
//! concurrent reader sees either the previous grid for a key or the new one.

use lru::LruCache;
use raster_common::{Coordinate, Extent, SampleGrid, TileCoord, TileGrid, TileKey};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// How the cache bounds its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Keep every grid for the lifetime of the cache.
    #[default]
    Unbounded,
    /// Keep at most this many grids.
    MaxTiles(NonZeroUsize),
    /// Keep at most this many bytes of samples.
    MaxBytes(u64),
}

impl EvictionPolicy {
    /// `0` means unbounded.
    pub fn max_tiles(count: usize) -> Self {
        NonZeroUsize::new(count).map_or(Self::Unbounded, Self::MaxTiles)
    }
}

/// Statistics for the tile value cache.
///
/// All fields are atomic for lock-free reads from metrics endpoints.
#[derive(Debug, Default)]
pub struct TileValueCacheStats {
    /// Lookups answered from a stored grid
    pub hits: AtomicU64,
    /// Lookups that fell back to the no-data sentinel
    pub misses: AtomicU64,
    /// Total grids stored (including overwrites)
    pub stores: AtomicU64,
    /// Grids removed by the eviction policy
    pub evictions: AtomicU64,
    /// Current number of grids
    pub entry_count: AtomicU64,
    /// Current sample bytes held
    pub size_bytes: AtomicU64,
}

impl TileValueCacheStats {
    /// Hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }

    fn snapshot(&self) -> Self {
        let copy = |v: &AtomicU64| AtomicU64::new(v.load(Ordering::Relaxed));
        Self {
            hits: copy(&self.hits),
            misses: copy(&self.misses),
            stores: copy(&self.stores),
            evictions: copy(&self.evictions),
            entry_count: copy(&self.entry_count),
            size_bytes: copy(&self.size_bytes),
        }
    }
}

/// Per-layer store of decoded tile grids.
pub struct TileValueCache {
    cache: RwLock<LruCache<TileKey, Arc<SampleGrid>>>,
    policy: EvictionPolicy,
    no_data: f64,
    key_includes_zoom: bool,
    stats: TileValueCacheStats,
}

impl TileValueCache {
    /// Create a cache that answers misses with `no_data`.
    pub fn new(no_data: f64, policy: EvictionPolicy) -> Self {
        let cache = match policy {
            EvictionPolicy::MaxTiles(capacity) => LruCache::new(capacity),
            EvictionPolicy::Unbounded | EvictionPolicy::MaxBytes(_) => LruCache::unbounded(),
        };

        Self {
            cache: RwLock::new(cache),
            policy,
            no_data,
            key_includes_zoom: false,
            stats: TileValueCacheStats::default(),
        }
    }

    /// Unbounded cache keyed by column and row.
    pub fn unbounded(no_data: f64) -> Self {
        Self::new(no_data, EvictionPolicy::Unbounded)
    }

    /// Qualify keys with the tile's zoom level.
    pub fn with_zoom_in_key(mut self, include: bool) -> Self {
        self.key_includes_zoom = include;
        self
    }

    pub fn no_data(&self) -> f64 {
        self.no_data
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Cache key for a tile under this cache's key scheme.
    pub fn key_for(&self, tile: TileCoord) -> TileKey {
        TileKey::for_tile(tile, self.key_includes_zoom)
    }

    /// Insert or replace the grid for `key`.
    ///
    /// The cache takes ownership of the grid; nothing outside can mutate it
    /// afterwards.
    pub async fn store(&self, key: TileKey, grid: SampleGrid) {
        self.store_shared(key, Arc::new(grid)).await;
    }

    /// Insert or replace with an already shared grid.
    pub async fn store_shared(&self, key: TileKey, grid: Arc<SampleGrid>) {
        let grid_bytes = grid.size_bytes() as u64;
        let mut cache = self.cache.write().await;

        match cache.push(key, grid) {
            Some((old_key, old)) if old_key == key => {
                // replaced in place
                self.stats
                    .size_bytes
                    .fetch_sub(old.size_bytes() as u64, Ordering::Relaxed);
            }
            Some((_, evicted)) => {
                // capacity-bound LRU pushed out its oldest entry
                self.stats
                    .size_bytes
                    .fetch_sub(evicted.size_bytes() as u64, Ordering::Relaxed);
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                self.stats.entry_count.fetch_add(1, Ordering::Relaxed);
            }
        }

        self.stats.size_bytes.fetch_add(grid_bytes, Ordering::Relaxed);
        self.stats.stores.fetch_add(1, Ordering::Relaxed);

        if let EvictionPolicy::MaxBytes(max_bytes) = self.policy {
            self.evict_to_bytes_locked(&mut cache, max_bytes, key);
        }

        debug!(key = %key, bytes = grid_bytes, entries = cache.len(), "Stored tile grid");
    }

    /// Pop LRU grids until the byte budget is met, never evicting `keep`.
    fn evict_to_bytes_locked(
        &self,
        cache: &mut LruCache<TileKey, Arc<SampleGrid>>,
        max_bytes: u64,
        keep: TileKey,
    ) {
        while self.stats.size_bytes.load(Ordering::Relaxed) > max_bytes && cache.len() > 1 {
            let Some((evicted_key, evicted)) = cache.pop_lru() else {
                break;
            };
            if evicted_key == keep {
                // the fresh grid alone exceeds the budget; keep it
                cache.push(evicted_key, evicted);
                break;
            }
            self.stats
                .size_bytes
                .fetch_sub(evicted.size_bytes() as u64, Ordering::Relaxed);
            self.stats.entry_count.fetch_sub(1, Ordering::Relaxed);
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// The stored grid for `key`, if any.
    pub async fn get(&self, key: TileKey) -> Option<Arc<SampleGrid>> {
        self.cache.write().await.get(&key).cloned()
    }

    pub async fn contains(&self, key: TileKey) -> bool {
        self.cache.read().await.contains(&key)
    }

    /// Sample at `(row, col)` of the grid stored under `key`.
    ///
    /// Returns the no-data sentinel when the key is absent or the indices
    /// fall outside the grid. Never fails.
    pub async fn lookup(&self, key: TileKey, row: usize, col: usize) -> f64 {
        let value = {
            let mut cache = self.cache.write().await;
            cache.get(&key).and_then(|grid| grid.get(row, col))
        };

        match value {
            Some(v) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                v
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                self.no_data
            }
        }
    }

    /// Sample under a map coordinate at a (possibly fractional) zoom.
    ///
    /// The zoom is rounded to the nearest integer level before the tile
    /// lookup. Coordinates off the tile grid resolve to no-data.
    pub async fn resolve_coordinate(
        &self,
        coord: Coordinate,
        zoom: f64,
        tile_grid: &dyn TileGrid,
    ) -> f64 {
        let Some(z) = integer_zoom(zoom) else {
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            return self.no_data;
        };
        let Some(tile) = tile_grid.tile_for_coord_and_zoom(coord, z) else {
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            return self.no_data;
        };

        let extent = tile_grid.extent_for_tile(tile);
        match pixel_for_coordinate(coord, &extent, tile_grid.tile_size()) {
            Some((row, col)) => self.lookup(self.key_for(tile), row, col).await,
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                self.no_data
            }
        }
    }

    /// Snapshot of the current statistics.
    pub fn stats(&self) -> TileValueCacheStats {
        self.stats.snapshot()
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }

    /// Drop every grid. Counters other than size and entries are kept.
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
        self.stats.entry_count.store(0, Ordering::Relaxed);
        self.stats.size_bytes.store(0, Ordering::Relaxed);
    }
}

/// Round a map zoom to a tile-grid level.
fn integer_zoom(zoom: f64) -> Option<u32> {
    let z = zoom.round();
    if !z.is_finite() || z < 0.0 || z > u32::MAX as f64 {
        return None;
    }
    Some(z as u32)
}

/// Grid cell `(row, col)` under `coord` inside a tile covering `extent`.
///
/// The vertical ratio is taken from the y ordinate and counted back from the
/// tile's top edge; the horizontal ratio from the x ordinate. A coordinate on
/// the tile's bottom edge maps to row `tile_size`, one past the grid, and
/// resolves to no-data.
pub fn pixel_for_coordinate(
    coord: Coordinate,
    extent: &Extent,
    tile_size: u32,
) -> Option<(usize, usize)> {
    let size = tile_size as f64;

    let rel_x = (coord.y - extent.min_y) / (extent.max_y - extent.min_y);
    let rel_y = (coord.x - extent.min_x) / (extent.max_x - extent.min_x);

    let pixel_y = (rel_y * size).floor();
    let pixel_x = size - (rel_x * size).floor();

    if !pixel_x.is_finite() || !pixel_y.is_finite() || pixel_x < 0.0 || pixel_y < 0.0 {
        return None;
    }

    // the stored grid is read as grid[pixel_x][pixel_y]
    Some((pixel_x as usize, pixel_y as usize))
}
