// Copyright 2026 the Glyphtess Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph cache key.

use glyphtess::Strategy;

/// Unique identifier for a cached glyph mesh.
///
/// Two glyphs with the same key are geometrically identical and share the
/// same cached artifact. The key includes every parameter that affects the
/// generated geometry, so changing the tessellation strategy or the size
/// class addresses a different entry instead of corrupting an existing
/// one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    /// Unique identifier for the font blob.
    pub font_id: u64,
    /// Glyph index within the font.
    pub glyph_id: u32,
    /// Tessellation strategy the mesh was built under.
    pub strategy: Strategy,
    /// Font size as f32 bits (exact match, no quantization).
    pub size_bits: u32,
}

impl GlyphKey {
    /// Creates a key.
    #[inline]
    pub fn new(font_id: u64, glyph_id: u32, strategy: Strategy, size: f32) -> Self {
        Self {
            font_id,
            glyph_id,
            strategy,
            size_bits: size.to_bits(),
        }
    }

    /// The font size this key was built for.
    pub fn size(&self) -> f32 {
        f32::from_bits(self.size_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_parameters_give_identical_keys() {
        let a = GlyphKey::new(1, 42, Strategy::Sdf, 16.0);
        let b = GlyphKey::new(1, 42, Strategy::Sdf, 16.0);
        assert_eq!(a, b);
    }

    #[test]
    fn strategy_and_size_partition_the_key_space() {
        let base = GlyphKey::new(1, 42, Strategy::Sdf, 16.0);
        assert_ne!(base, GlyphKey::new(1, 42, Strategy::Triangulation, 16.0));
        assert_ne!(base, GlyphKey::new(1, 42, Strategy::Sdf, 17.0));
        assert_eq!(base.size(), 16.0);
    }
}
