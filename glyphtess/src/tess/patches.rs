// Copyright 2026 the Glyphtess Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Curve-patch tessellation for a GPU tessellation stage.
//!
//! Curves are never flattened: every quadratic boundary segment becomes a
//! patch of three control-point indices the GPU re-evaluates at draw time
//! (cubics are first approximated by a quadratic spline). The CPU side
//! triangulates only the inner polygon, whose boundary follows the chord
//! of a curve when the control point lies outside the fill and detours
//! through the control point when it lies inside, so polygon plus patches
//! tile the glyph exactly.

use kurbo::{Point, Vec2};

use crate::mesh::{CurvePatch, GlyphMesh, MeshPayload, MeshVertex};
use crate::outline::{GlyphOutline, Segment};
use crate::resolve::PolygonResolver;
use crate::tess::{resolve_or_degrade, triangulate};

pub(crate) fn tessellate(
    outline: &GlyphOutline,
    resolver: &PolygonResolver,
    tolerance: f64,
) -> GlyphMesh {
    // Which side of the walk direction the fill lies on. TrueType outlines
    // fill to the right, PostScript-flavored ones to the left; the dominant
    // orientation of the outline decides, never a trusted convention.
    let total_area: f64 = outline
        .contours
        .iter()
        .map(|c| c.signed_area_doubled(tolerance))
        .sum();
    let fill_left = total_area >= 0.0;

    let mut quads: Vec<(Point, Point, Point)> = Vec::new();
    let mut polylines: Vec<Vec<Point>> = Vec::new();
    for contour in &outline.contours {
        let mut polyline = vec![contour.start];
        let mut last = contour.start;
        for seg in &contour.segments {
            match *seg {
                Segment::Line { to } => polyline.push(to),
                Segment::Quad { ctrl, to } => {
                    push_quad(last, ctrl, to, fill_left, &mut polyline, &mut quads);
                }
                Segment::Cubic { ctrl0, ctrl1, to } => {
                    for (a, c, b) in
                        crate::flatten::cubic_to_quads(last, ctrl0, ctrl1, to, tolerance)
                    {
                        push_quad(a, c, b, fill_left, &mut polyline, &mut quads);
                    }
                }
            }
            last = seg.end();
        }
        if polyline.len() > 1 && polyline.last() == Some(&polyline[0]) {
            polyline.pop();
        }
        polylines.push(polyline);
    }

    let resolved = resolve_or_degrade(resolver, outline.glyph_id, polylines);
    let mut mesh = triangulate::tessellate(&resolved);

    let mut patches = Vec::with_capacity(quads.len());
    for (start, ctrl, end) in quads {
        patches.push(CurvePatch {
            start: vertex_index(&mut mesh.vertices, start),
            control: vertex_index(&mut mesh.vertices, ctrl),
            end: vertex_index(&mut mesh.vertices, end),
        });
    }
    mesh.payload = MeshPayload::Patches { patches };
    mesh
}

/// Records one quadratic patch and extends the inner polygon boundary.
///
/// When the control point is on the fill side the curve bulges away from
/// the fill and the triangle (start, control, end) lies inside it, so the
/// polygon detours through the control point and the patch carves the
/// curve out of that triangle. Otherwise the triangle lies outside the fill
/// and the patch adds the sliver between chord and curve.
fn push_quad(
    start: Point,
    ctrl: Point,
    end: Point,
    fill_left: bool,
    polyline: &mut Vec<Point>,
    quads: &mut Vec<(Point, Point, Point)>,
) {
    quads.push((start, ctrl, end));
    let side = cross(end - start, ctrl - start);
    let control_on_fill_side = if fill_left { side > 0.0 } else { side < 0.0 };
    if control_on_fill_side {
        polyline.push(ctrl);
    }
    polyline.push(end);
}

/// Index of `p` in the vertex buffer, appending it when absent.
///
/// Patch corners shared with the inner polygon reuse its vertices, the way
/// a GPU upload path expects a single joint buffer.
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

fn cross(a: Vec2, b: Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}
