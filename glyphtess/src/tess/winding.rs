// Copyright 2026 the Glyphtess Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Segment-list tessellation for per-pixel winding evaluation.
//!
//! The only triangles drawn are the glyph's bounding quad; the fragment
//! shader computes coverage analytically from the line and curve segment
//! buffers, so overlap and self-intersection need no CPU resolution at
//! all. Curve control points are preserved losslessly (cubics as a
//! quadratic spline).

use kurbo::Point;

use crate::mesh::{GlyphMesh, MeshPayload, MeshVertex};
use crate::outline::{GlyphOutline, Segment};
use crate::tess::sdf::BOUNDING_QUAD_INDICES;

pub(crate) fn tessellate(outline: &GlyphOutline, tolerance: f64) -> GlyphMesh {
    let mut vertices: Vec<MeshVertex> = Vec::new();
    let mut line_indices: Vec<u32> = Vec::new();
    let mut curve_indices: Vec<u32> = Vec::new();

    let mut push_line = |vertices: &mut Vec<MeshVertex>, a: Point, b: Point| {
        line_indices.push(vertex_index(vertices, a));
        line_indices.push(vertex_index(vertices, b));
    };
    let mut push_curve = |vertices: &mut Vec<MeshVertex>, a: Point, c: Point, b: Point| {
        curve_indices.push(vertex_index(vertices, a));
        curve_indices.push(vertex_index(vertices, c));
        curve_indices.push(vertex_index(vertices, b));
    };

    for contour in &outline.contours {
        let mut last = contour.start;
        for seg in &contour.segments {
            match *seg {
                Segment::Line { to } => push_line(&mut vertices, last, to),
                Segment::Quad { ctrl, to } => push_curve(&mut vertices, last, ctrl, to),
                Segment::Cubic { ctrl0, ctrl1, to } => {
                    for (a, c, b) in
                        crate::flatten::cubic_to_quads(last, ctrl0, ctrl1, to, tolerance)
                    {
                        push_curve(&mut vertices, a, c, b);
                    }
                }
            }
            last = seg.end();
        }
    }

    // The bounding quad rides at the end of the same vertex buffer.
    let base = vertices.len() as u32;
    vertices.extend(outline.bounding_quad().map(MeshVertex::from));
    let indices = BOUNDING_QUAD_INDICES.map(|i| base + i).to_vec();

    GlyphMesh {
        vertices,
        indices,
        payload: MeshPayload::Winding {
            line_indices,
            curve_indices,
        },
    }
}

fn vertex_index(vertices: &mut Vec<MeshVertex>, p: Point) -> u32 {
    let v = MeshVertex::from(p);
    for (i, existing) in vertices.iter().enumerate() {
        if *existing == v {
            return i as u32;
        }
    }
    vertices.push(v);
    (vertices.len() - 1) as u32
}
