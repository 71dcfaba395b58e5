// Copyright 2026 the Glyphtess Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU triangulation of resolved outlines by ear clipping.
//!
//! Holes are first merged into their enclosing fill loop through bridge
//! edges, producing one simple polygon per fill region, which is then ear
//! clipped. The triangle set covers the fill region exactly with no
//! overlap; triangulation order is unspecified but deterministic.

use kurbo::{Point, Vec2};

use crate::mesh::{GlyphMesh, MeshPayload, MeshVertex};
use crate::resolve::{winding_number, FillClass, ResolvedOutline};

pub(crate) fn tessellate(resolved: &ResolvedOutline) -> GlyphMesh {
    let mut vertices: Vec<MeshVertex> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    for (fill, holes) in group_fills_with_holes(resolved) {
        let polygon = merge_holes(fill, holes);
        let base = vertices.len() as u32;
        let triangles = ear_clip(&polygon);
        vertices.extend(polygon.iter().copied().map(MeshVertex::from));
        indices.extend(triangles.into_iter().map(|i| base + i));
    }

    GlyphMesh {
        vertices,
        indices,
        payload: MeshPayload::Triangles,
    }
}

/// Pairs every fill loop with the holes it encloses.
///
/// Fill loops are normalized counter-clockwise and holes clockwise, the
/// orientation the bridge splice and ear test assume. A hole belongs to the
/// smallest fill loop containing it, so nested figures (an "o" inside a
/// larger counter) pair up correctly.
fn group_fills_with_holes(resolved: &ResolvedOutline) -> Vec<(Vec<Point>, Vec<Vec<Point>>)> {
    let mut fills: Vec<(Vec<Point>, f64)> = Vec::new();
    let mut holes: Vec<Vec<Point>> = Vec::new();
    for contour in &resolved.contours {
        let area2 = contour.signed_area_doubled();
        match contour.class {
            FillClass::Fill => {
                let mut pts = contour.points.clone();
                if area2 < 0.0 {
                    pts.reverse();
                }
                fills.push((pts, area2.abs()));
            }
            FillClass::Hole => {
                let mut pts = contour.points.clone();
                if area2 > 0.0 {
                    pts.reverse();
                }
                holes.push(pts);
            }
        }
    }

    let mut groups: Vec<(Vec<Point>, Vec<Vec<Point>>)> =
        fills.iter().map(|(pts, _)| (pts.clone(), Vec::new())).collect();
    for hole in holes {
        let sample = hole[0].midpoint(hole[1 % hole.len()]);
        let owner = fills
            .iter()
            .enumerate()
            .filter(|(_, (pts, _))| winding_number(pts, sample) != 0)
            .min_by(|a, b| a.1 .1.total_cmp(&b.1 .1))
            .map(|(i, _)| i);
        if let Some(i) = owner {
            groups[i].1.push(hole);
        }
        // A hole outside every fill loop is inconsistent input; dropping it
        // renders strictly more than requested, never less.
    }
    groups
}

/// Splices each hole into the outer loop via a bridge edge, yielding one
/// simple polygon.
///
/// The bridge runs from the hole's rightmost vertex to a visible outer
/// vertex; both endpoints are duplicated so the polygon boundary travels
/// the bridge twice in opposite directions, keeping the interior simply
/// connected.
fn merge_holes(outer: Vec<Point>, mut holes: Vec<Vec<Point>>) -> Vec<Point> {
    let mut polygon = outer;
    // Rightmost holes first, so later bridges cannot cross earlier ones.
    holes.sort_by(|a, b| max_x(b).total_cmp(&max_x(a)));

    for hole in holes {
        let m = rightmost_vertex(&hole);
        let Some(v) = visible_vertex(&polygon, hole[m]) else {
            // No unobstructed bridge; skip the hole rather than emit a
            // self-intersecting polygon.
            continue;
        };
        let mut merged = Vec::with_capacity(polygon.len() + hole.len() + 2);
        merged.extend_from_slice(&polygon[..=v]);
        for k in 0..hole.len() {
            merged.push(hole[(m + k) % hole.len()]);
        }
        merged.push(hole[m]);
        merged.extend_from_slice(&polygon[v..]);
        polygon = merged;
    }
    polygon
}

fn max_x(pts: &[Point]) -> f64 {
    pts.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max)
}

fn rightmost_vertex(pts: &[Point]) -> usize {
    let mut best = 0;
    for (i, p) in pts.iter().enumerate() {
        if p.x > pts[best].x {
            best = i;
        }
    }
    best
}

/// The nearest polygon vertex connectable to `from` without crossing a
/// polygon edge.
fn visible_vertex(polygon: &[Point], from: Point) -> Option<usize> {
    let mut best: Option<(f64, usize)> = None;
    'candidates: for (v, &p) in polygon.iter().enumerate() {
        let d = from.distance(p);
        if best.is_some_and(|(bd, _)| bd <= d) {
            continue;
        }
        for i in 0..polygon.len() {
            let a = polygon[i];
            let b = polygon[(i + 1) % polygon.len()];
            if segments_cross(from, p, a, b) {
                continue 'candidates;
            }
        }
        best = Some((d, v));
    }
    best.map(|(_, v)| v)
}

/// Proper crossing test; contact at a shared endpoint does not count.
fn segments_cross(p0: Point, p1: Point, q0: Point, q1: Point) -> bool {
    const EPS: f64 = 1e-12;
    if p0.distance(q0) <= EPS
        || p0.distance(q1) <= EPS
        || p1.distance(q0) <= EPS
        || p1.distance(q1) <= EPS
    {
        return false;
    }
    let d1 = cross(p1 - p0, q0 - p0);
    let d2 = cross(p1 - p0, q1 - p0);
    let d3 = cross(q1 - q0, p0 - q0);
    let d4 = cross(q1 - q0, p1 - q0);
    (d1 * d2 < 0.0 && d3 * d4 < 0.0)
        || (d1.abs() <= EPS && on_segment(p0, p1, q0))
        || (d2.abs() <= EPS && on_segment(p0, p1, q1))
        || (d3.abs() <= EPS && on_segment(q0, q1, p0))
        || (d4.abs() <= EPS && on_segment(q0, q1, p1))
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Ear clipping of a simple counter-clockwise polygon.
///
/// Returns triangle index triples into `pts`. Collinear ears are clipped
/// as zero-area triangles so bridge duplicates cannot stall the loop; if
/// numerically inconsistent input stalls it anyway, the remainder is
/// fan-filled so a glyph always produces a mesh.
fn ear_clip(pts: &[Point]) -> Vec<u32> {
    let n = pts.len();
    if n < 3 {
        return Vec::new();
    }
    let mut prev: Vec<usize> = (0..n).map(|i| (i + n - 1) % n).collect();
    let mut next: Vec<usize> = (0..n).map(|i| (i + 1) % n).collect();
    let mut alive = vec![true; n];
    let mut triangles = Vec::with_capacity(3 * (n - 2));

    let mut remaining = n;
    let mut i = 0;
    let mut since_last_clip = 0;
    while remaining > 3 {
        if is_ear(pts, &prev, &next, &alive, i) {
            triangles.extend([prev[i] as u32, i as u32, next[i] as u32]);
            alive[i] = false;
            next[prev[i]] = next[i];
            prev[next[i]] = prev[i];
            remaining -= 1;
            since_last_clip = 0;
            i = next[i];
        } else {
            i = next[i];
            since_last_clip += 1;
            if since_last_clip > remaining {
                // Stalled; fan-fill what is left.
                let anchor = i;
                let mut j = next[i];
                while next[j] != anchor {
                    triangles.extend([anchor as u32, j as u32, next[j] as u32]);
                    j = next[j];
                }
                return triangles;
            }
        }
    }
    triangles.extend([prev[i] as u32, i as u32, next[i] as u32]);
    triangles
}

fn is_ear(pts: &[Point], prev: &[usize], next: &[usize], alive: &[bool], i: usize) -> bool {
    let a = pts[prev[i]];
    let b = pts[i];
    let c = pts[next[i]];
    if cross(b - a, c - b) < 0.0 {
        return false;
    }
    for (j, &live) in alive.iter().enumerate() {
        if !live || j == prev[i] || j == i || j == next[i] {
            continue;
        }
        if point_in_triangle(pts[j], a, b, c) {
            return false;
        }
    }
    true
}

/// Strictly-inside test; boundary points (bridge duplicates) do not block
/// an ear.
fn point_in_triangle(p: Point, a: Point, b: Point, c: Point) -> bool {
    const EPS: f64 = 1e-12;
    let d1 = cross(b - a, p - a);
    let d2 = cross(c - b, p - b);
    let d3 = cross(a - c, p - c);
    d1 > EPS && d2 > EPS && d3 > EPS
}

fn cross(a: Vec2, b: Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::PolygonResolver;

    fn mesh_area(mesh: &GlyphMesh) -> f64 {
        mesh.indices
            .chunks(3)
            .map(|t| {
                let a = mesh.vertices[t[0] as usize];
                let b = mesh.vertices[t[1] as usize];
                let c = mesh.vertices[t[2] as usize];
                let ab = (f64::from(b.x - a.x), f64::from(b.y - a.y));
                let ac = (f64::from(c.x - a.x), f64::from(c.y - a.y));
                (ab.0 * ac.1 - ab.1 * ac.0).abs() / 2.0
            })
            .sum()
    }

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point> {
        vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]
    }

    #[test]
    fn square_becomes_two_triangles() {
        let resolved = PolygonResolver::default()
            .resolve(vec![square(0.0, 0.0, 4.0, 4.0)])
            .unwrap();
        let mesh = tessellate(&resolved);
        assert_eq!(mesh.indices.len(), 6);
        assert!((mesh_area(&mesh) - 16.0).abs() < 1e-6);
    }

    #[test]
    fn hole_area_is_subtracted() {
        let mut inner = square(3.0, 3.0, 7.0, 7.0);
        inner.reverse();
        let resolved = PolygonResolver::default()
            .resolve(vec![square(0.0, 0.0, 10.0, 10.0), inner])
            .unwrap();
        let mesh = tessellate(&resolved);
        assert!((mesh_area(&mesh) - 84.0).abs() < 1e-6);
        // Bridged ring of 10 vertices yields 8 triangles.
        assert_eq!(mesh.indices.len() % 3, 0);
    }

    #[test]
    fn concave_polygon_triangulates_exactly() {
        // An L shape.
        let l = vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 4.0),
            Point::new(0.0, 4.0),
        ];
        let resolved = PolygonResolver::default().resolve(vec![l]).unwrap();
        let mesh = tessellate(&resolved);
        assert!((mesh_area(&mesh) - 7.0).abs() < 1e-6);
    }

    #[test]
    fn overlap_is_not_double_covered() {
        // Two overlapping triangles under nonzero: triangle area equals the
        // union, not the sum.
        let a = vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(0.0, 4.0),
        ];
        let b = vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
        ];
        let resolved = PolygonResolver::default().resolve(vec![a, b]).unwrap();
        let union = resolved.filled_area();
        let mesh = tessellate(&resolved);
        assert!((mesh_area(&mesh) - union).abs() < 1e-6);
        assert!(union < 16.0 - 1e-6, "union must exclude the overlap");
    }

    #[test]
    fn nested_figures_pair_holes_with_the_smallest_fill() {
        // A ring inside the hole of a larger ring.
        let outer = square(0.0, 0.0, 20.0, 20.0);
        let mut outer_hole = square(2.0, 2.0, 18.0, 18.0);
        outer_hole.reverse();
        let inner = square(6.0, 6.0, 14.0, 14.0);
        let mut inner_hole = square(8.0, 8.0, 12.0, 12.0);
        inner_hole.reverse();
        let resolved = PolygonResolver::default()
            .resolve(vec![outer, outer_hole, inner, inner_hole])
            .unwrap();
        let mesh = tessellate(&resolved);
        let expected = (400.0 - 256.0) + (64.0 - 16.0);
        assert!((mesh_area(&mesh) - expected).abs() < 1e-6);
    }
}
