// Copyright 2026 the Glyphtess Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph mesh cache with single-flight builds and LRU eviction.

use std::sync::Arc;

use glyphtess::{GlyphMesh, MeshPayload};
use hashbrown::HashMap;
use parking_lot::{Condvar, Mutex};

use crate::atlas::{AtlasFullError, AtlasRegion, FontAtlas};
use crate::key::GlyphKey;

/// Capacity limits of a [`GlyphCache`].
#[derive(Clone, Copy, Debug)]
pub struct CacheConfig {
    /// Eviction starts once cached meshes exceed this many bytes.
    pub budget_bytes: usize,
    /// Atlas texture width in texels.
    pub atlas_width: u32,
    /// Atlas texture height in texels.
    pub atlas_height: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            budget_bytes: 8 * 1024 * 1024,
            atlas_width: 1024,
            atlas_height: 1024,
        }
    }
}

/// A cached build result: the immutable mesh plus, for distance-field
/// entries, the atlas region its bitmap occupies.
#[derive(Clone, Debug)]
pub struct CachedGlyph {
    /// The glyph's geometry, shared with every other holder of this entry.
    pub mesh: Arc<GlyphMesh>,
    /// Where the entry's bitmap lives in the atlas, when it has one.
    pub region: Option<AtlasRegion>,
}

/// Hit/miss counters, readable without touching the cache contents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that ran the build pipeline.
    pub misses: u64,
    /// Entries currently cached.
    pub entries: usize,
    /// Bytes of cached geometry currently held.
    pub bytes: usize,
}

#[derive(Debug)]
struct Entry {
    mesh: Arc<GlyphMesh>,
    region: Option<AtlasRegion>,
    bytes: usize,
    /// Last-touch counter for LRU ordering.
    epoch: u64,
}

#[derive(Debug)]
enum Slot {
    /// A build is in flight on another caller's thread.
    Building,
    Ready(Entry),
}

#[derive(Debug)]
struct Inner {
    entries: HashMap<GlyphKey, Slot>,
    atlas: FontAtlas,
    epoch: u64,
    bytes: usize,
    hits: u64,
    misses: u64,
}

/// Clears a `Building` slot if the builder unwinds, so waiters on the same
/// key retry instead of blocking forever. Disarmed once the build returns.
struct BuildGuard<'a> {
    cache: &'a GlyphCache,
    key: GlyphKey,
    armed: bool,
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.cache.inner.lock().entries.remove(&self.key);
            self.cache.ready.notify_all();
        }
    }
}

/// Keyed storage of built glyph meshes.
///
/// Concurrent `get_or_build` calls for distinct keys run their builds in
/// parallel; calls for the same key serialize, with the first caller
/// building and the rest waiting on its result (single-flight). Eviction
/// is least-recently-used, bounded by the configured byte budget, and
/// returns distance-field atlas regions to the packer.
#[derive(Debug)]
pub struct GlyphCache {
    budget_bytes: usize,
    inner: Mutex<Inner>,
    ready: Condvar,
}

impl Default for GlyphCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl GlyphCache {
    /// Creates a cache with the given limits.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            budget_bytes: config.budget_bytes,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                atlas: FontAtlas::new(config.atlas_width, config.atlas_height),
                epoch: 0,
                bytes: 0,
                hits: 0,
                misses: 0,
            }),
            ready: Condvar::new(),
        }
    }

    /// Returns the cached artifact for `key`, building it at most once.
    ///
    /// On a miss, `build` runs outside the cache lock; concurrent callers
    /// with the same key block until it finishes and then share the
    /// result. A structural outline error inside `build` is logged and
    /// cached as a placeholder mesh, so one bad glyph never fails a frame.
    /// `Err` means the atlas could not pack the entry's bitmap even after
    /// evicting everything evictable; the call may be retried after
    /// raising the budget or invalidating entries.
    pub fn get_or_build(
        &self,
        key: GlyphKey,
        build: impl FnOnce() -> Result<GlyphMesh, glyphtess::Error>,
    ) -> Result<CachedGlyph, AtlasFullError> {
        let mut inner = self.inner.lock();
        loop {
            match inner.entries.get(&key) {
                Some(Slot::Ready(_)) => {
                    inner.epoch += 1;
                    inner.hits += 1;
                    let epoch = inner.epoch;
                    let Some(Slot::Ready(entry)) = inner.entries.get_mut(&key) else {
                        unreachable!();
                    };
                    entry.epoch = epoch;
                    return Ok(CachedGlyph {
                        mesh: Arc::clone(&entry.mesh),
                        region: entry.region,
                    });
                }
                Some(Slot::Building) => {
                    // Re-check after every wakeup; a failed build removes
                    // the slot and this caller becomes the builder.
                    self.ready.wait(&mut inner);
                }
                None => break,
            }
        }
        inner.misses += 1;
        inner.entries.insert(key, Slot::Building);
        drop(inner);

        let mut guard = BuildGuard {
            cache: self,
            key,
            armed: true,
        };
        let mesh = Arc::new(build().unwrap_or_else(|err| {
            log::warn!(
                "glyph {} (font {:#x}): structural outline error ({err}); caching a placeholder",
                key.glyph_id,
                key.font_id
            );
            GlyphMesh::placeholder()
        }));
        guard.armed = false;

        let mut inner = self.inner.lock();
        let region = match Self::pack_bitmap(&mut inner, &mesh) {
            Ok(region) => region,
            Err(err) => {
                inner.entries.remove(&key);
                drop(inner);
                self.ready.notify_all();
                return Err(err);
            }
        };
        let bytes = mesh_bytes(&mesh);
        inner.epoch += 1;
        let epoch = inner.epoch;
        inner.bytes += bytes;
        inner.entries.insert(
            key,
            Slot::Ready(Entry {
                mesh: Arc::clone(&mesh),
                region,
                bytes,
                epoch,
            }),
        );
        self.evict_over_budget(&mut inner, key);
        drop(inner);
        self.ready.notify_all();
        Ok(CachedGlyph { mesh, region })
    }

    /// Removes every entry built under `strategy`.
    ///
    /// Entries for other strategies keep their cached geometry; builds in
    /// flight are unaffected and land under the new configuration's keys.
    pub fn invalidate_strategy(&self, strategy: glyphtess::Strategy) {
        self.invalidate_where(|key| key.strategy == strategy);
    }

    /// Removes every entry built for `size`.
    pub fn invalidate_size(&self, size: f32) {
        let size_bits = size.to_bits();
        self.invalidate_where(|key| key.size_bits == size_bits);
    }

    /// Current hit/miss counters and occupancy.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entries: inner.entries.len(),
            bytes: inner.bytes,
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    fn invalidate_where(&self, pred: impl Fn(&GlyphKey) -> bool) {
        let mut inner = self.inner.lock();
        let victims: Vec<GlyphKey> = inner
            .entries
            .iter()
            .filter(|(key, slot)| pred(key) && matches!(slot, Slot::Ready(_)))
            .map(|(key, _)| *key)
            .collect();
        for key in victims {
            Self::remove_entry(&mut inner, key);
        }
    }

    /// Finds atlas space for a distance-field mesh, evicting the least
    /// recently used entries until the bitmap fits.
    fn pack_bitmap(
        inner: &mut Inner,
        mesh: &GlyphMesh,
    ) -> Result<Option<AtlasRegion>, AtlasFullError> {
        let MeshPayload::Sdf { bitmap } = &mesh.payload else {
            return Ok(None);
        };
        loop {
            match inner.atlas.allocate(bitmap.width, bitmap.height) {
                Ok(region) => return Ok(Some(region)),
                Err(err) => match Self::lru_key(inner, None) {
                    Some(victim) => Self::remove_entry(inner, victim),
                    None => return Err(err),
                },
            }
        }
    }

    fn evict_over_budget(&self, inner: &mut Inner, keep: GlyphKey) {
        while inner.bytes > self.budget_bytes {
            // The newest entry always stays, even when it alone exceeds
            // the budget.
            match Self::lru_key(inner, Some(keep)) {
                Some(victim) => Self::remove_entry(inner, victim),
                None => break,
            }
        }
    }

    fn lru_key(inner: &Inner, protect: Option<GlyphKey>) -> Option<GlyphKey> {
        inner
            .entries
            .iter()
            .filter_map(|(key, slot)| match slot {
                Slot::Ready(entry) if protect != Some(*key) => Some((*key, entry.epoch)),
                _ => None,
            })
            .min_by_key(|&(_, epoch)| epoch)
            .map(|(key, _)| key)
    }

    fn remove_entry(inner: &mut Inner, key: GlyphKey) {
        if let Some(Slot::Ready(entry)) = inner.entries.remove(&key) {
            inner.bytes -= entry.bytes;
            if let Some(region) = entry.region {
                inner.atlas.free(region);
            }
        }
    }
}

/// Approximate heap footprint of a mesh, for budget accounting.
fn mesh_bytes(mesh: &GlyphMesh) -> usize {
    let payload = match &mesh.payload {
        MeshPayload::Triangles => 0,
        MeshPayload::Patches { patches } => patches.len() * 12,
        MeshPayload::Sdf { bitmap } => bitmap.data.len(),
        MeshPayload::Winding {
            line_indices,
            curve_indices,
        } => (line_indices.len() + curve_indices.len()) * 4,
    };
    mesh.vertices.len() * 8 + mesh.indices.len() * 4 + payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphtess::{MeshVertex, Strategy};

    fn test_mesh(size: usize) -> GlyphMesh {
        GlyphMesh {
            vertices: vec![MeshVertex::new(0.0, 0.0); size],
            indices: vec![0; 3],
            payload: MeshPayload::Triangles,
        }
    }

    fn key(glyph_id: u32) -> GlyphKey {
        GlyphKey::new(1, glyph_id, Strategy::Triangulation, 16.0)
    }

    #[test]
    fn hit_skips_the_build_path() {
        let cache = GlyphCache::default();
        let first = cache.get_or_build(key(1), || Ok(test_mesh(4))).unwrap();
        let second = cache
            .get_or_build(key(1), || panic!("cache hit must not rebuild"))
            .unwrap();
        assert!(Arc::ptr_eq(&first.mesh, &second.mesh));
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn structural_error_caches_a_placeholder() {
        let cache = GlyphCache::default();
        let built = cache
            .get_or_build(key(2), || {
                let mut builder = glyphtess::OutlineBuilder::new(2);
                builder.move_to(glyphtess::kurbo::Point::new(0.0, 0.0));
                builder.line_to(glyphtess::kurbo::Point::new(1.0, 1.0));
                builder.finish().map(|_| unreachable!())
            })
            .unwrap();
        assert!(built.mesh.is_empty());
        // The placeholder is cached; the glyph is not rebuilt every frame.
        let again = cache
            .get_or_build(key(2), || panic!("placeholder must be cached"))
            .unwrap();
        assert!(Arc::ptr_eq(&built.mesh, &again.mesh));
    }

    #[test]
    fn panicking_build_releases_the_slot() {
        let cache = Arc::new(GlyphCache::default());
        let worker = Arc::clone(&cache);
        let crashed = std::thread::spawn(move || {
            worker.get_or_build(key(9), || panic!("builder bug"))
        })
        .join();
        assert!(crashed.is_err(), "the builder panic must propagate");
        // The slot is free again: the next caller becomes the builder
        // instead of waiting forever on the dead build.
        let mut rebuilt = false;
        let built = cache
            .get_or_build(key(9), || {
                rebuilt = true;
                Ok(test_mesh(4))
            })
            .unwrap();
        assert!(rebuilt);
        assert_eq!(built.mesh.vertices.len(), 4);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn budget_evicts_least_recently_used() {
        let cache = GlyphCache::new(CacheConfig {
            // Room for roughly two of the meshes below.
            budget_bytes: 2200,
            ..CacheConfig::default()
        });
        cache.get_or_build(key(1), || Ok(test_mesh(128))).unwrap();
        cache.get_or_build(key(2), || Ok(test_mesh(128))).unwrap();
        // Touch 1 so 2 becomes the LRU entry.
        cache.get_or_build(key(1), || Ok(test_mesh(128))).unwrap();
        cache.get_or_build(key(3), || Ok(test_mesh(128))).unwrap();

        let mut rebuilt = false;
        cache
            .get_or_build(key(1), || {
                rebuilt = true;
                Ok(test_mesh(128))
            })
            .unwrap();
        assert!(!rebuilt, "recently used entry survived eviction");
        let mut rebuilt = false;
        cache
            .get_or_build(key(2), || {
                rebuilt = true;
                Ok(test_mesh(128))
            })
            .unwrap();
        assert!(rebuilt, "LRU entry was evicted");
    }

    #[test]
    fn invalidation_is_scoped_to_strategy_and_size() {
        let cache = GlyphCache::default();
        let tri = GlyphKey::new(1, 1, Strategy::Triangulation, 16.0);
        let sdf = GlyphKey::new(1, 1, Strategy::Sdf, 16.0);
        let big = GlyphKey::new(1, 1, Strategy::Triangulation, 32.0);
        for k in [tri, sdf, big] {
            cache.get_or_build(k, || Ok(test_mesh(4))).unwrap();
        }

        cache.invalidate_strategy(Strategy::Sdf);
        assert_eq!(cache.len(), 2);
        cache.invalidate_size(32.0);
        assert_eq!(cache.len(), 1);
        // The surviving entry still hits.
        cache
            .get_or_build(tri, || panic!("entry should have survived"))
            .unwrap();
    }

    #[test]
    fn atlas_region_is_reclaimed_on_eviction() {
        use glyphtess::SdfBitmap;
        let sdf_mesh = || {
            Ok(GlyphMesh {
                vertices: vec![MeshVertex::new(0.0, 0.0); 4],
                indices: vec![0, 3, 1, 2, 1, 3],
                payload: MeshPayload::Sdf {
                    bitmap: SdfBitmap {
                        width: 64,
                        height: 64,
                        data: vec![0; 64 * 64],
                    },
                },
            })
        };
        // Atlas fits exactly one 64x64 bitmap.
        let cache = GlyphCache::new(CacheConfig {
            atlas_width: 64,
            atlas_height: 64,
            ..CacheConfig::default()
        });
        let a = cache
            .get_or_build(GlyphKey::new(1, 1, Strategy::Sdf, 16.0), sdf_mesh)
            .unwrap();
        assert!(a.region.is_some());
        // Packing the second bitmap evicts the first and reuses its region.
        let b = cache
            .get_or_build(GlyphKey::new(1, 2, Strategy::Sdf, 16.0), sdf_mesh)
            .unwrap();
        assert_eq!(a.region, b.region);
        assert_eq!(cache.len(), 1);
    }
}
