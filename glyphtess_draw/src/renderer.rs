// Copyright 2026 the Glyphtess Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph preparation for rendering backends.
//!
//! The renderer is one concrete type configured with a tessellation
//! strategy, not a hierarchy of per-strategy subclasses; backends select
//! behavior through [`RendererConfig`]. Cross-cutting measurement is a
//! decorator ([`TimedRenderer`]) wrapping any [`GlyphRenderer`].

use std::time::Instant;

use glyphtess::{GlyphOutline, TessellationConfig, Tessellator};
use kurbo::Point;

use crate::atlas::AtlasFullError;
use crate::cache::{CacheConfig, CachedGlyph, GlyphCache};
use crate::key::GlyphKey;

/// Supplies glyph outlines, implemented by the font-parsing layer.
pub trait OutlineSource {
    /// Stable identifier of the font blob, used in cache keys.
    fn font_id(&self) -> u64;

    /// Extracts the outline of `glyph_id` in font units.
    fn outline(&self, glyph_id: u32) -> Result<GlyphOutline, glyphtess::Error>;

    /// Maps a Unicode code point to a glyph index, when the font covers
    /// it.
    fn glyph_for_char(&self, codepoint: u32) -> Option<u32>;
}

/// One positioned glyph from the shaper.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapedGlyph {
    /// Glyph index within the font.
    pub glyph_id: u32,
    /// Pen position of the glyph origin.
    pub position: Point,
}

/// A glyph ready to draw: cached geometry plus its placement.
#[derive(Clone, Debug)]
pub struct PreparedGlyph {
    /// The cached mesh and, for distance-field entries, its atlas region.
    pub cached: CachedGlyph,
    /// Pen position of the glyph origin.
    pub position: Point,
}

/// An inclusive range of Unicode code points, for batch cache warm-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharacterRange {
    /// First code point of the range.
    pub start: u32,
    /// Last code point of the range, inclusive.
    pub end: u32,
}

impl CharacterRange {
    /// The printable ASCII range, the usual warm-up set.
    pub const ASCII: Self = Self {
        start: 0x20,
        end: 0x7e,
    };

    /// Iterates the code points of the range.
    pub fn code_points(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }
}

/// Start-up configuration of a [`Renderer`].
#[derive(Clone, Copy, Debug, Default)]
pub struct RendererConfig {
    /// Strategy, tolerance and fill rule of the tessellation pipeline.
    pub tessellation: TessellationConfig,
    /// Font size the prepared geometry is keyed under.
    pub size: f32,
    /// Cache and atlas limits.
    pub cache: CacheConfig,
}

/// Prepares positioned glyphs for drawing.
///
/// The one seam a backend or decorator needs; everything else on
/// [`Renderer`] is convenience built on it.
pub trait GlyphRenderer {
    /// Returns draw-ready geometry for one glyph, building and caching it
    /// on first use.
    fn prepare(
        &self,
        source: &dyn OutlineSource,
        glyph: ShapedGlyph,
    ) -> Result<PreparedGlyph, AtlasFullError>;
}

/// The concrete renderer: a tessellator plus the glyph cache.
#[derive(Debug)]
pub struct Renderer {
    config: RendererConfig,
    tessellator: Tessellator,
    cache: GlyphCache,
}

impl Renderer {
    /// Creates a renderer for the given configuration.
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            tessellator: Tessellator::new(config.tessellation),
            cache: GlyphCache::new(config.cache),
        }
    }

    /// The configuration the renderer was built with.
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// The underlying cache, for stats and targeted invalidation.
    pub fn cache(&self) -> &GlyphCache {
        &self.cache
    }

    /// Prepares a shaped run in order.
    pub fn prepare_run(
        &self,
        source: &dyn OutlineSource,
        glyphs: &[ShapedGlyph],
    ) -> Result<Vec<PreparedGlyph>, AtlasFullError> {
        glyphs
            .iter()
            .map(|&glyph| self.prepare(source, glyph))
            .collect()
    }

    /// Builds cache entries for every covered code point in `range`.
    ///
    /// Returns how many glyphs were prepared. Code points the font does
    /// not cover are skipped.
    pub fn prefill(
        &self,
        source: &dyn OutlineSource,
        range: CharacterRange,
    ) -> Result<usize, AtlasFullError> {
        let mut prepared = 0;
        for codepoint in range.code_points() {
            let Some(glyph_id) = source.glyph_for_char(codepoint) else {
                continue;
            };
            self.prepare(
                source,
                ShapedGlyph {
                    glyph_id,
                    position: Point::ZERO,
                },
            )?;
            prepared += 1;
        }
        Ok(prepared)
    }
}

impl GlyphRenderer for Renderer {
    fn prepare(
        &self,
        source: &dyn OutlineSource,
        glyph: ShapedGlyph,
    ) -> Result<PreparedGlyph, AtlasFullError> {
        let key = GlyphKey::new(
            source.font_id(),
            glyph.glyph_id,
            self.config.tessellation.strategy,
            self.config.size,
        );
        let cached = self.cache.get_or_build(key, || {
            let outline = source.outline(glyph.glyph_id)?;
            self.tessellator.tessellate(&outline)
        })?;
        Ok(PreparedGlyph {
            cached,
            position: glyph.position,
        })
    }
}

/// Decorator logging how long each preparation takes.
///
/// Wraps any [`GlyphRenderer`]; composition replaces the timing subclass
/// an inheritance design would need.
#[derive(Debug)]
pub struct TimedRenderer<R> {
    inner: R,
}

impl<R> TimedRenderer<R> {
    /// Wraps `inner`.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Unwraps the decorated renderer.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: GlyphRenderer> GlyphRenderer for TimedRenderer<R> {
    fn prepare(
        &self,
        source: &dyn OutlineSource,
        glyph: ShapedGlyph,
    ) -> Result<PreparedGlyph, AtlasFullError> {
        let start = Instant::now();
        let result = self.inner.prepare(source, glyph);
        log::debug!(
            "prepared glyph {} in {:?}",
            glyph.glyph_id,
            start.elapsed()
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphtess::{OutlineBuilder, Strategy};

    /// A one-glyph "font": every glyph id maps to a unit square scaled by
    /// the id.
    struct SquareFont;

    impl OutlineSource for SquareFont {
        fn font_id(&self) -> u64 {
            7
        }

        fn outline(&self, glyph_id: u32) -> Result<GlyphOutline, glyphtess::Error> {
            let s = f64::from(glyph_id.max(1));
            let mut builder = OutlineBuilder::new(glyph_id);
            builder.move_to(Point::new(0.0, 0.0));
            builder.line_to(Point::new(s, 0.0));
            builder.line_to(Point::new(s, s));
            builder.line_to(Point::new(0.0, s));
            builder.close();
            builder.finish()
        }

        fn glyph_for_char(&self, codepoint: u32) -> Option<u32> {
            (codepoint % 2 == 0).then_some(codepoint)
        }
    }

    fn renderer(strategy: Strategy) -> Renderer {
        Renderer::new(RendererConfig {
            tessellation: TessellationConfig {
                strategy,
                ..TessellationConfig::default()
            },
            size: 16.0,
            cache: CacheConfig::default(),
        })
    }

    #[test]
    fn repeated_preparation_hits_the_cache() {
        let renderer = renderer(Strategy::Triangulation);
        let glyph = ShapedGlyph {
            glyph_id: 3,
            position: Point::new(10.0, 0.0),
        };
        let first = renderer.prepare(&SquareFont, glyph).unwrap();
        let second = renderer.prepare(&SquareFont, glyph).unwrap();
        assert_eq!(first.cached.mesh, second.cached.mesh);
        assert_eq!(renderer.cache().stats().misses, 1);
        assert_eq!(renderer.cache().stats().hits, 1);
    }

    #[test]
    fn run_preparation_keeps_positions() {
        let renderer = renderer(Strategy::WindingNumber);
        let run = [
            ShapedGlyph {
                glyph_id: 1,
                position: Point::new(0.0, 0.0),
            },
            ShapedGlyph {
                glyph_id: 2,
                position: Point::new(12.0, 0.0),
            },
        ];
        let prepared = renderer.prepare_run(&SquareFont, &run).unwrap();
        assert_eq!(prepared.len(), 2);
        assert_eq!(prepared[1].position, Point::new(12.0, 0.0));
    }

    #[test]
    fn prefill_skips_uncovered_code_points() {
        let renderer = renderer(Strategy::Sdf);
        let range = CharacterRange {
            start: 0x20,
            end: 0x29,
        };
        // SquareFont covers even code points only: 5 of 10.
        let prepared = renderer.prefill(&SquareFont, range).unwrap();
        assert_eq!(prepared, 5);
        assert_eq!(renderer.cache().len(), 5);
    }

    #[test]
    fn timing_decorator_is_transparent() {
        let timed = TimedRenderer::new(renderer(Strategy::Triangulation));
        let glyph = ShapedGlyph {
            glyph_id: 4,
            position: Point::ZERO,
        };
        let prepared = timed.prepare(&SquareFont, glyph).unwrap();
        assert!(!prepared.cached.mesh.is_empty());
        assert_eq!(timed.into_inner().cache().len(), 1);
    }
}
