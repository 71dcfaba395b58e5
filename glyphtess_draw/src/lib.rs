// Copyright 2026 the Glyphtess Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyphtess Draw manages the lifecycle of tessellated glyph geometry
//! across frames and draw calls.
//!
//! On top of the [`glyphtess`] pipeline it provides:
//!
//! - [`GlyphCache`]: keyed storage of built meshes with single-flight
//!   builds, hit/miss statistics and LRU eviction under a byte budget.
//! - [`FontAtlas`]: a shelf packer handing out non-overlapping texture
//!   regions for distance-field bitmaps, reclaiming them on eviction.
//! - [`Renderer`]: glyph preparation keyed by font, glyph, strategy and
//!   size, with a [`TimedRenderer`] decorator for measurement.
//!
//! GPU upload itself stays outside this crate; meshes are immutable once
//! cached and expose their buffers as raw bytes.

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]

mod atlas;
mod cache;
mod key;
mod renderer;

pub use atlas::{AtlasFullError, AtlasRegion, FontAtlas};
pub use cache::{CacheConfig, CacheStats, CachedGlyph, GlyphCache};
pub use key::GlyphKey;
pub use renderer::{
    CharacterRange, GlyphRenderer, OutlineSource, PreparedGlyph, Renderer, RendererConfig,
    ShapedGlyph, TimedRenderer,
};
