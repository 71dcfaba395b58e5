// Copyright 2026 the Glyphtess Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tessellation strategies turning resolved outlines into glyph meshes.

use kurbo::Point;

use crate::mesh::GlyphMesh;
use crate::outline::GlyphOutline;
use crate::resolve::{PolygonResolver, ResolvedOutline, WindingRule};
use crate::{Error, ErrorKind};

mod patches;
mod sdf;
mod triangulate;
mod winding;

/// The tessellation algorithm a renderer is configured with.
///
/// Selected once per renderer configuration, not per glyph. The set is
/// closed: every strategy the crate supports is a variant here and
/// dispatch is a single `match`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// CPU ear-clipping triangulation of the resolved fill polygons.
    #[default]
    Triangulation,
    /// Curve patches evaluated by a GPU tessellation stage.
    TessellationShaders,
    /// Signed-distance bitmap sampled from the font atlas.
    Sdf,
    /// Segment lists for analytic per-pixel winding evaluation.
    WindingNumber,
}

/// Start-up configuration of the tessellation pipeline.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TessellationConfig {
    /// Which algorithm to run.
    pub strategy: Strategy,
    /// Curve flattening tolerance in font units.
    pub tolerance: f64,
    /// Fill rule for classification.
    pub winding_rule: WindingRule,
    /// Side length in texels of generated distance-field bitmaps.
    pub sdf_resolution: u32,
}

impl Default for TessellationConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            // Font units are integers in the thousands; one unit is far
            // below a pixel at any realistic size.
            tolerance: 1.0,
            winding_rule: WindingRule::default(),
            sdf_resolution: 64,
        }
    }
}

/// Converts glyph outlines into draw-ready meshes with a fixed strategy.
#[derive(Clone, Debug)]
pub struct Tessellator {
    config: TessellationConfig,
    resolver: PolygonResolver,
}

impl Default for Tessellator {
    fn default() -> Self {
        Self::new(TessellationConfig::default())
    }
}

impl Tessellator {
    /// Creates a tessellator for the given configuration.
    pub fn new(config: TessellationConfig) -> Self {
        Self {
            config,
            resolver: PolygonResolver::new(config.winding_rule),
        }
    }

    /// The configuration the tessellator was built with.
    pub fn config(&self) -> &TessellationConfig {
        &self.config
    }

    /// Produces the glyph's mesh under the configured strategy.
    ///
    /// The same outline always yields the same mesh, and all strategies
    /// agree on the rendered silhouette; only the representation differs.
    /// Structural outline errors are the caller's to handle (the glyph
    /// cache substitutes a placeholder); resolution failures degrade to
    /// classification-only handling internally and never surface.
    pub fn tessellate(&self, outline: &GlyphOutline) -> Result<GlyphMesh, Error> {
        if outline.is_empty() {
            return Ok(GlyphMesh::placeholder());
        }
        let mesh = match self.config.strategy {
            Strategy::Triangulation => {
                let resolved = self.resolve(outline)?;
                triangulate::tessellate(&resolved)
            }
            Strategy::TessellationShaders => {
                patches::tessellate(outline, &self.resolver, self.config.tolerance)
            }
            Strategy::Sdf => {
                let resolved = self.resolve(outline)?;
                sdf::tessellate(outline, &resolved, self.config.sdf_resolution)
            }
            // Per-pixel winding handles overlap at draw time; no resolver.
            Strategy::WindingNumber => winding::tessellate(outline, self.config.tolerance),
        };
        Ok(mesh)
    }

    fn resolve(&self, outline: &GlyphOutline) -> Result<ResolvedOutline, Error> {
        let polylines: Vec<Vec<Point>> = outline
            .contours
            .iter()
            .map(|c| c.flatten(self.config.tolerance))
            .collect();
        Ok(resolve_or_degrade(
            &self.resolver,
            outline.glyph_id,
            polylines,
        ))
    }
}

/// Resolves polylines, degrading to classification-only handling when the
/// intersection walk fails.
///
/// A failed walk is a bug signal, so it is logged with the glyph identity,
/// but rendering continues with the contours treated as already simple.
pub(crate) fn resolve_or_degrade(
    resolver: &PolygonResolver,
    glyph_id: u32,
    polylines: Vec<Vec<Point>>,
) -> ResolvedOutline {
    match resolver.resolve(polylines.clone()) {
        Ok(resolved) => resolved,
        Err(err) => {
            debug_assert_eq!(err.kind(), ErrorKind::ResolutionFailed);
            log::warn!(
                "glyph {glyph_id}: contour resolution failed ({err}); \
                 treating contours as simple"
            );
            resolver.assume_simple(polylines)
        }
    }
}
