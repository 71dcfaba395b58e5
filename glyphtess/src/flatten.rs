// Copyright 2026 the Glyphtess Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic flattening of quadratic and cubic Bézier segments.
//!
//! Flattening uses uniform parameter subdivision with an analytic bound on
//! the chord deviation, so the same curve at the same tolerance always
//! produces the same point sequence. The endpoints of the returned sequence
//! are the exact curve endpoints, which keeps contours index-closed after
//! flattening.

use kurbo::{Point, Vec2};

/// Upper bound on subdivisions for a single segment.
///
/// A glyph segment that legitimately needs more than this is far below any
/// sensible tolerance already; the cap guards against degenerate inputs
/// (NaN tolerance, enormous coordinates) driving unbounded allocation.
const MAX_SUBDIVISIONS: usize = 1024;

/// Returns the number of uniform subdivisions needed so that every chord of
/// a quadratic stays within `tolerance` of the curve.
///
/// The deviation of a quadratic from the chord of a `1/n` parameter span is
/// bounded by `|p0 - 2*p1 + p2| / (8 * n^2)`.
fn quad_subdivisions(p0: Point, p1: Point, p2: Point, tolerance: f64) -> usize {
    let d = p0.to_vec2() - 2.0 * p1.to_vec2() + p2.to_vec2();
    let err = d.hypot();
    if !(err > 0.0) || !(tolerance > 0.0) {
        return 1;
    }
    let n = (err / (8.0 * tolerance)).sqrt().ceil();
    (n as usize).clamp(1, MAX_SUBDIVISIONS)
}

/// Like [`quad_subdivisions`], for a cubic.
///
/// Uses the standard bound on the second derivative hodograph:
/// `max(|p0 - 2*p1 + p2|, |p1 - 2*p2 + p3|)`.
fn cubic_subdivisions(p0: Point, p1: Point, p2: Point, p3: Point, tolerance: f64) -> usize {
    let d1 = p0.to_vec2() - 2.0 * p1.to_vec2() + p2.to_vec2();
    let d2 = p1.to_vec2() - 2.0 * p2.to_vec2() + p3.to_vec2();
    let err = 3.0 * d1.hypot().max(d2.hypot());
    if !(err > 0.0) || !(tolerance > 0.0) {
        return 1;
    }
    let n = (err / (8.0 * tolerance)).sqrt().ceil();
    (n as usize).clamp(1, MAX_SUBDIVISIONS)
}

/// Evaluates a quadratic Bézier at `t`.
pub(crate) fn eval_quad(p0: Point, p1: Point, p2: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    let v: Vec2 =
        (mt * mt) * p0.to_vec2() + (2.0 * mt * t) * p1.to_vec2() + (t * t) * p2.to_vec2();
    v.to_point()
}

/// Evaluates a cubic Bézier at `t`.
pub(crate) fn eval_cubic(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    let v: Vec2 = (mt * mt * mt) * p0.to_vec2()
        + (3.0 * mt * mt * t) * p1.to_vec2()
        + (3.0 * mt * t * t) * p2.to_vec2()
        + (t * t * t) * p3.to_vec2();
    v.to_point()
}

/// Appends the flattening of a quadratic to `out`, excluding the start
/// point and ending with exactly `p2`.
///
/// A degenerate quadratic (zero length or collinear control point)
/// contributes a single line to the end point, never zero edges.
pub(crate) fn flatten_quad(p0: Point, p1: Point, p2: Point, tolerance: f64, out: &mut Vec<Point>) {
    let n = quad_subdivisions(p0, p1, p2, tolerance);
    for i in 1..n {
        let t = i as f64 / n as f64;
        out.push(eval_quad(p0, p1, p2, t));
    }
    out.push(p2);
}

/// Appends the flattening of a cubic to `out`, excluding the start point
/// and ending with exactly `p3`.
pub(crate) fn flatten_cubic(
    p0: Point,
    p1: Point,
    p2: Point,
    p3: Point,
    tolerance: f64,
    out: &mut Vec<Point>,
) {
    let n = cubic_subdivisions(p0, p1, p2, p3, tolerance);
    for i in 1..n {
        let t = i as f64 / n as f64;
        out.push(eval_cubic(p0, p1, p2, p3, t));
    }
    out.push(p3);
}

/// Derivative of a cubic Bézier at `t`.
fn eval_cubic_deriv(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Vec2 {
    let mt = 1.0 - t;
    3.0 * ((mt * mt) * (p1 - p0) + (2.0 * mt * t) * (p2 - p1) + (t * t) * (p3 - p2))
}

/// Approximates a cubic Bézier by a spline of quadratics within `tolerance`.
///
/// Each returned triple is `(start, control, end)`; consecutive triples
/// share endpoints and the first/last points are the exact cubic endpoints.
/// Used by the strategies that hand quadratic control points to the GPU,
/// where flattening would defeat the purpose.
pub(crate) fn cubic_to_quads(
    p0: Point,
    p1: Point,
    p2: Point,
    p3: Point,
    tolerance: f64,
) -> Vec<(Point, Point, Point)> {
    // Midpoint degree reduction of a cubic errs by at most
    // sqrt(3)/36 * |p3 - 3*p2 + 3*p1 - p0|, shrinking cubically with
    // subdivision.
    let d = (p3.to_vec2() - p0.to_vec2()) + 3.0 * (p1.to_vec2() - p2.to_vec2());
    let err = 3.0_f64.sqrt() / 36.0 * d.hypot();
    let n = if err > 0.0 && tolerance > 0.0 {
        ((err / tolerance).cbrt().ceil() as usize).clamp(1, 16)
    } else {
        1
    };

    let mut quads = Vec::with_capacity(n);
    let mut start = p0;
    for i in 0..n {
        let t0 = i as f64 / n as f64;
        let t1 = (i + 1) as f64 / n as f64;
        let dt = t1 - t0;
        let end = if i + 1 == n {
            p3
        } else {
            eval_cubic(p0, p1, p2, p3, t1)
        };
        // Sub-cubic inner control points, then midpoint degree reduction.
        let q1 = start + (dt / 3.0) * eval_cubic_deriv(p0, p1, p2, p3, t0);
        let q2 = end - (dt / 3.0) * eval_cubic_deriv(p0, p1, p2, p3, t1);
        let ctrl = ((3.0 * (q1.to_vec2() + q2.to_vec2()) - start.to_vec2() - end.to_vec2()) / 4.0)
            .to_point();
        quads.push((start, ctrl, end));
        start = end;
    }
    quads
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distance_to_quad(p: Point, p0: Point, p1: Point, p2: Point) -> f64 {
        // Dense parameter sweep is plenty for a test oracle.
        (0..=1000)
            .map(|i| {
                let t = i as f64 / 1000.0;
                eval_quad(p0, p1, p2, t).distance(p)
            })
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn quad_endpoints_are_exact() {
        let p0 = Point::new(0.0, 0.0);
        let p1 = Point::new(5.0, 10.0);
        let p2 = Point::new(10.0, 0.0);
        let mut pts = vec![p0];
        flatten_quad(p0, p1, p2, 0.1, &mut pts);
        assert_eq!(pts[0], p0);
        assert_eq!(*pts.last().unwrap(), p2);
    }

    #[test]
    fn quad_stays_within_tolerance() {
        // (0,0) -> (10,0) with control (5,10) at tolerance 0.1.
        let p0 = Point::new(0.0, 0.0);
        let p1 = Point::new(5.0, 10.0);
        let p2 = Point::new(10.0, 0.0);
        let mut pts = vec![p0];
        flatten_quad(p0, p1, p2, 0.1, &mut pts);
        assert!(pts.len() > 2, "curved segment should subdivide");
        for p in &pts {
            assert!(
                distance_to_quad(*p, p0, p1, p2) <= 0.1,
                "point {p:?} drifted off the curve"
            );
        }
    }

    #[test]
    fn flattening_is_deterministic() {
        let p0 = Point::new(-3.0, 7.0);
        let p1 = Point::new(4.0, -2.0);
        let p2 = Point::new(11.0, 9.0);
        let mut a = Vec::new();
        let mut b = Vec::new();
        flatten_quad(p0, p1, p2, 0.25, &mut a);
        flatten_quad(p0, p1, p2, 0.25, &mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn degenerate_quad_yields_single_line() {
        // Collinear control point: no subdivision needed.
        let p0 = Point::new(0.0, 0.0);
        let p1 = Point::new(5.0, 0.0);
        let p2 = Point::new(10.0, 0.0);
        let mut pts = Vec::new();
        flatten_quad(p0, p1, p2, 0.1, &mut pts);
        assert_eq!(pts, vec![p2]);

        // Zero-length curve still closes the contour with one edge.
        let mut pts = Vec::new();
        flatten_quad(p0, p0, p0, 0.1, &mut pts);
        assert_eq!(pts, vec![p0]);
    }

    #[test]
    fn cubic_to_quads_tracks_the_curve() {
        let p0 = Point::new(0.0, 0.0);
        let p1 = Point::new(0.0, 10.0);
        let p2 = Point::new(10.0, 10.0);
        let p3 = Point::new(10.0, 0.0);
        let quads = cubic_to_quads(p0, p1, p2, p3, 0.05);
        assert!(quads.len() > 1, "an S-free arch still needs subdivision");
        assert_eq!(quads.first().unwrap().0, p0);
        assert_eq!(quads.last().unwrap().2, p3);
        // Consecutive quads share endpoints.
        for pair in quads.windows(2) {
            assert_eq!(pair[0].2, pair[1].0);
        }
        // Spot-check the spline against the cubic at quad midpoints.
        for (i, &(a, c, b)) in quads.iter().enumerate() {
            let t = (i as f64 + 0.5) / quads.len() as f64;
            let on_cubic = eval_cubic(p0, p1, p2, p3, t);
            let on_quad = eval_quad(a, c, b, 0.5);
            assert!(on_cubic.distance(on_quad) < 0.2);
        }
    }

    #[test]
    fn degenerate_cubic_is_one_quad() {
        let p0 = Point::new(0.0, 0.0);
        let p3 = Point::new(9.0, 0.0);
        let quads = cubic_to_quads(p0, Point::new(3.0, 0.0), Point::new(6.0, 0.0), p3, 0.1);
        assert_eq!(quads.len(), 1);
        assert_eq!(quads[0].0, p0);
        assert_eq!(quads[0].2, p3);
    }

    #[test]
    fn cubic_endpoints_are_exact() {
        let p0 = Point::new(0.0, 0.0);
        let p1 = Point::new(2.0, 8.0);
        let p2 = Point::new(8.0, 8.0);
        let p3 = Point::new(10.0, 0.0);
        let mut pts = vec![p0];
        flatten_cubic(p0, p1, p2, p3, 0.1, &mut pts);
        assert_eq!(pts[0], p0);
        assert_eq!(*pts.last().unwrap(), p3);
        assert!(pts.len() > 2, "curved segment should subdivide");
    }
}
