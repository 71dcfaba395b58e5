// Copyright 2026 the Glyphtess Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shelf-packed texture region allocator for rasterized glyph bitmaps.
//!
//! The atlas hands out non-overlapping rectangles of a fixed-size texture.
//! Allocation opens horizontal shelves of the requested height and packs
//! left to right; freed rectangles go on a free list and are reused for
//! later requests that fit, so eviction churn does not leak space. The
//! atlas itself never touches pixel data; callers upload bitmaps into the
//! regions it returns.

use smallvec::SmallVec;

/// A rectangle of atlas texels handed out by [`FontAtlas::allocate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasRegion {
    /// X position in texels.
    pub x: u32,
    /// Y position in texels.
    pub y: u32,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
}

impl AtlasRegion {
    /// Normalized texture coordinates of the region:
    /// `[u0, v0, u1, v1]` over the given atlas dimensions.
    pub fn uv_rect(&self, atlas_width: u32, atlas_height: u32) -> [f32; 4] {
        let w = atlas_width as f32;
        let h = atlas_height as f32;
        [
            self.x as f32 / w,
            self.y as f32 / h,
            (self.x + self.width) as f32 / w,
            (self.y + self.height) as f32 / h,
        ]
    }

    fn overlaps(&self, other: &Self) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// The atlas cannot pack the requested rectangle.
///
/// Retryable: freeing regions (for example by evicting cache entries) or
/// configuring a larger atlas makes the same request succeed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasFullError {
    /// Requested width in texels.
    pub width: u32,
    /// Requested height in texels.
    pub height: u32,
}

impl core::fmt::Display for AtlasFullError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "atlas cannot pack a {}x{} region",
            self.width, self.height
        )
    }
}

impl core::error::Error for AtlasFullError {}

#[derive(Clone, Copy, Debug)]
struct Shelf {
    y: u32,
    height: u32,
    cursor: u32,
}

/// Fixed-size shelf packer for glyph bitmap regions.
#[derive(Debug)]
pub struct FontAtlas {
    width: u32,
    height: u32,
    shelves: SmallVec<[Shelf; 8]>,
    /// Top of the unopened area below the last shelf.
    next_shelf_y: u32,
    free: Vec<AtlasRegion>,
}

impl FontAtlas {
    /// Creates an empty atlas of the given texel dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            shelves: SmallVec::new(),
            next_shelf_y: 0,
            free: Vec::new(),
        }
    }

    /// Atlas width in texels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Atlas height in texels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Allocates a `width` x `height` region.
    ///
    /// Freed regions are preferred over opening new shelf space; a freed
    /// rectangle is reused when the request fits in it, and any leftover is
    /// split off and returned to the free list.
    pub fn allocate(&mut self, width: u32, height: u32) -> Result<AtlasRegion, AtlasFullError> {
        if width == 0 || height == 0 || width > self.width || height > self.height {
            return Err(AtlasFullError { width, height });
        }

        // Best-fit over the free list: smallest leftover area wins.
        let mut reuse: Option<(usize, u32)> = None;
        for (i, slot) in self.free.iter().enumerate() {
            if slot.width >= width && slot.height >= height {
                let waste = slot.width * slot.height - width * height;
                if reuse.is_none_or(|(_, best)| waste < best) {
                    reuse = Some((i, waste));
                }
            }
        }
        if let Some((i, _)) = reuse {
            let slot = self.free.swap_remove(i);
            // Guillotine split: the leftover of a larger slot stays on the
            // free list as two strips instead of leaking.
            if slot.width > width {
                self.free.push(AtlasRegion {
                    x: slot.x + width,
                    y: slot.y,
                    width: slot.width - width,
                    height: slot.height,
                });
            }
            if slot.height > height {
                self.free.push(AtlasRegion {
                    x: slot.x,
                    y: slot.y + height,
                    width,
                    height: slot.height - height,
                });
            }
            return Ok(AtlasRegion {
                x: slot.x,
                y: slot.y,
                width,
                height,
            });
        }

        // An open shelf tall enough, with room at its cursor.
        for shelf in &mut self.shelves {
            if shelf.height >= height && shelf.cursor + width <= self.width {
                let region = AtlasRegion {
                    x: shelf.cursor,
                    y: shelf.y,
                    width,
                    height,
                };
                shelf.cursor += width;
                return Ok(region);
            }
        }

        // Open a new shelf.
        if self.next_shelf_y + height > self.height {
            return Err(AtlasFullError { width, height });
        }
        let shelf = Shelf {
            y: self.next_shelf_y,
            height,
            cursor: width,
        };
        self.next_shelf_y += height;
        self.shelves.push(shelf);
        Ok(AtlasRegion {
            x: 0,
            y: shelf.y,
            width,
            height,
        })
    }

    /// Returns a region to the atlas for reuse.
    ///
    /// The region must have come from [`allocate`](Self::allocate) and must
    /// not be freed twice; live neighbors are unaffected.
    pub fn free(&mut self, region: AtlasRegion) {
        debug_assert!(
            !self.free.contains(&region),
            "region freed twice: {region:?}"
        );
        self.free.push(region);
    }

    /// Drops all allocations, returning the atlas to its empty state.
    pub fn clear(&mut self) {
        self.shelves.clear();
        self.next_shelf_y = 0;
        self.free.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_disjoint(regions: &[AtlasRegion]) {
        for (i, a) in regions.iter().enumerate() {
            for b in &regions[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn allocations_never_overlap() {
        let mut atlas = FontAtlas::new(256, 256);
        let mut live = Vec::new();
        for i in 0..20 {
            let w = 16 + (i % 5) * 8;
            let h = 16 + (i % 3) * 8;
            live.push(atlas.allocate(w, h).unwrap());
        }
        assert_disjoint(&live);
    }

    #[test]
    fn freed_region_is_reused() {
        let mut atlas = FontAtlas::new(64, 64);
        let a = atlas.allocate(64, 64).unwrap();
        assert!(atlas.allocate(16, 16).is_err(), "atlas is full");
        atlas.free(a);
        let b = atlas.allocate(16, 16).unwrap();
        assert!(b.x < 64 && b.y < 64);
    }

    #[test]
    fn reuse_keeps_the_slot_remainder_allocatable() {
        let mut atlas = FontAtlas::new(64, 64);
        let big = atlas.allocate(64, 64).unwrap();
        atlas.free(big);
        // A smaller request takes a corner of the freed slot; the rest of
        // the slot must still be available, not discarded.
        let a = atlas.allocate(32, 32).unwrap();
        let b = atlas.allocate(32, 32).unwrap();
        let c = atlas.allocate(32, 64).unwrap();
        assert_disjoint(&[a, b, c]);
    }

    #[test]
    fn churn_keeps_live_regions_disjoint() {
        let mut atlas = FontAtlas::new(128, 128);
        let mut live: Vec<AtlasRegion> = Vec::new();
        for round in 0_u32..200 {
            if live.len() > 12 {
                // Free an arbitrary but deterministic entry.
                let victim = live.swap_remove((round as usize * 7) % live.len());
                atlas.free(victim);
            }
            if let Ok(region) = atlas.allocate(16 + (round % 4) * 4, 16) {
                live.push(region);
            }
            assert_disjoint(&live);
        }
        assert!(!live.is_empty());
    }

    #[test]
    fn oversized_request_fails_cleanly() {
        let mut atlas = FontAtlas::new(64, 64);
        let err = atlas.allocate(128, 8).unwrap_err();
        assert_eq!(
            err,
            AtlasFullError {
                width: 128,
                height: 8
            }
        );
        // The failure left the atlas usable.
        assert!(atlas.allocate(32, 32).is_ok());
    }

    #[test]
    fn uv_rect_is_normalized() {
        let mut atlas = FontAtlas::new(128, 128);
        let region = atlas.allocate(64, 32).unwrap();
        let [u0, v0, u1, v1] = region.uv_rect(128, 128);
        assert_eq!([u0, v0], [0.0, 0.0]);
        assert_eq!([u1, v1], [0.5, 0.25]);
    }
}
