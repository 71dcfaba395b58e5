// Copyright 2026 the Glyphtess Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyphtess converts font glyph outlines into renderable geometry for GPU
//! rasterization.
//!
//! The pipeline runs raw outline → [`GlyphOutline`] → [`ResolvedOutline`] →
//! [`GlyphMesh`]:
//!
//! - [`OutlineBuilder`] normalizes the line/curve commands a font parser
//!   emits into closed contours, reporting open loops instead of repairing
//!   them.
//! - [`PolygonResolver`] decomposes overlapping and self-intersecting
//!   contours into simple loops classified as fill or hole by winding
//!   number.
//! - [`Tessellator`] turns the result into a [`GlyphMesh`] under one of
//!   four interchangeable strategies: CPU triangulation, GPU curve
//!   patches, signed-distance bitmaps or per-pixel winding segment lists.
//!   Switching strategies changes the representation, never the rendered
//!   shape.
//!
//! Caching of meshes and atlas packing of distance-field bitmaps live in
//! the companion `glyphtess_draw` crate.
//!
//! ## Features
//!
//! - `skrifa`: lets a [`skrifa`] outline pen drive [`OutlineBuilder`]
//!   directly, so glyphs load straight from font data.

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

mod error;
mod flatten;
mod mesh;
mod outline;
mod resolve;
mod ring;
mod tess;

pub use error::{Error, ErrorKind};
pub use mesh::{CurvePatch, GlyphMesh, MeshPayload, MeshVertex, SdfBitmap};
pub use outline::{Contour, GlyphMetrics, GlyphOutline, OutlineBuilder, Segment};
pub use resolve::{
    FillClass, PolygonResolver, ResolvedContour, ResolvedOutline, WindingRule,
};
pub use ring::{EdgeRing, NodeId, RingIter};
pub use tess::{Strategy, TessellationConfig, Tessellator};

// Re-exported because outline and mesh geometry is expressed in its types.
pub use kurbo;
