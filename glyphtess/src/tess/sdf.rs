// Copyright 2026 the Glyphtess Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Signed-distance-field rasterization of resolved outlines.
//!
//! The glyph's bounding box is sampled on a fixed grid; each texel stores
//! the distance to the nearest boundary edge, signed by the fill
//! classification from resolution and quantized to a byte with 128 on the
//! outline. The mesh itself is just the bounding quad, drawn with the
//! bitmap sampled across it from the font atlas.

use kurbo::{Point, Rect, Vec2};

use crate::mesh::{GlyphMesh, MeshPayload, MeshVertex, SdfBitmap};
use crate::outline::GlyphOutline;
use crate::resolve::ResolvedOutline;

/// Distance spread in texels mapped onto the byte range.
///
/// Eight texels of falloff at the default 64-texel resolution matches the
/// usual SDF rasterizer setting and leaves enough range for smooth edges
/// and small outline effects.
const SPREAD: f64 = 8.0;

/// Index pattern drawing the bounding quad
/// (bottom-left, top-left, top-right, bottom-right) as two triangles.
pub(crate) const BOUNDING_QUAD_INDICES: [u32; 6] = [0, 3, 1, 2, 1, 3];

pub(crate) fn tessellate(
    outline: &GlyphOutline,
    resolved: &ResolvedOutline,
    resolution: u32,
) -> GlyphMesh {
    let bbox = outline.bounding_box();
    let bitmap = rasterize(resolved, bbox, resolution);

    GlyphMesh {
        vertices: outline.bounding_quad().map(MeshVertex::from).to_vec(),
        indices: BOUNDING_QUAD_INDICES.to_vec(),
        payload: MeshPayload::Sdf { bitmap },
    }
}

fn rasterize(resolved: &ResolvedOutline, bbox: Rect, resolution: u32) -> SdfBitmap {
    let resolution = resolution.max(1);
    let scale = bbox.width().max(bbox.height()).max(f64::MIN_POSITIVE) / f64::from(resolution);

    let mut data = Vec::with_capacity((resolution * resolution) as usize);
    for y in 0..resolution {
        for x in 0..resolution {
            // Texel centers, y growing upward to match font units.
            let p = Point::new(
                bbox.x0 + (f64::from(x) + 0.5) / f64::from(resolution) * bbox.width(),
                bbox.y0 + (f64::from(y) + 0.5) / f64::from(resolution) * bbox.height(),
            );
            let distance = boundary_distance(resolved, p) / scale;
            let signed = if resolved.contains(p) {
                distance
            } else {
                -distance
            };
            let quantized = 128.0 + (signed / SPREAD).clamp(-1.0, 1.0) * 127.0;
            data.push(quantized.round().clamp(0.0, 255.0) as u8);
        }
    }
    SdfBitmap {
        width: resolution,
        height: resolution,
        data,
    }
}

/// Distance from `p` to the nearest resolved boundary edge.
fn boundary_distance(resolved: &ResolvedOutline, p: Point) -> f64 {
    let mut best = f64::INFINITY;
    for contour in &resolved.contours {
        let pts = &contour.points;
        for i in 0..pts.len() {
            let a = pts[i];
            let b = pts[(i + 1) % pts.len()];
            best = best.min(segment_distance(p, a, b));
        }
    }
    best
}

fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab: Vec2 = b - a;
    let len2 = ab.hypot2();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (a + t * ab).distance(p)
}
