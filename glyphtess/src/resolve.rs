// Copyright 2026 the Glyphtess Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Decomposition of overlapping, possibly self-intersecting contours into
//! simple polygons classified as fill or hole.
//!
//! The resolver works on flattened contours held in a shared vertex pool,
//! with each contour represented as an [`EdgeRing`] of vertex indices. Edge
//! intersections are inserted as new ring nodes, splitting the two edges at
//! the intersection point without re-linking the rest of the cycle. Each
//! split edge is then tested against the fill rule: the winding number of
//! the whole outline is evaluated just left and just right of the edge, and
//! the edge is kept only when exactly one side is filled, oriented so the
//! filled side lies to its left. Linking the kept edges back into cycles
//! yields the boundary loops of the filled region: counter-clockwise loops
//! bound fill, clockwise loops bound holes, and edges interior to an
//! overlap drop out entirely, so overlapping contours merge into their
//! union instead of double-counting it.
//!
//! Junction rule: where several kept edges leave a shared vertex, the
//! trace continues along the one making the sharpest counter-clockwise
//! turn from the incoming direction (straight ahead is the sharpest of
//! all). This keeps every traced loop on the boundary of a single filled
//! region, so self-intersecting input like a figure-eight splits into one
//! simple loop per lobe. Exact angle ties break on end-vertex index, so
//! degenerate fans resolve deterministically.

use hashbrown::{HashMap, HashSet};
use kurbo::{Point, Vec2};
use smallvec::SmallVec;

use crate::outline::{signed_area_doubled, GlyphOutline};
use crate::ring::{EdgeRing, NodeId};
use crate::Error;

/// Fill rule used to classify resolved regions.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum WindingRule {
    /// A region is filled when its winding number is nonzero.
    ///
    /// This is the convention of both TrueType and PostScript outlines.
    #[default]
    NonZero,
    /// A region is filled when its winding number is odd.
    EvenOdd,
}

impl WindingRule {
    /// Whether a region with the given winding number is filled.
    pub fn is_filled(self, winding: i32) -> bool {
        match self {
            Self::NonZero => winding != 0,
            Self::EvenOdd => winding % 2 != 0,
        }
    }
}

/// Classification of a resolved contour.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FillClass {
    /// The contour bounds a filled region.
    Fill,
    /// The contour bounds a hole inside a filled region.
    Hole,
}

/// One simple, non-self-intersecting loop of a resolved outline.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedContour {
    /// Polygon vertices in walk order; the edge from the last point back to
    /// the first closes the loop.
    pub points: Vec<Point>,
    /// Whether this loop bounds fill or a hole.
    pub class: FillClass,
}

impl ResolvedContour {
    /// Twice the signed area of this loop.
    pub fn signed_area_doubled(&self) -> f64 {
        signed_area_doubled(&self.points)
    }

    /// The unsigned area of this loop.
    pub fn area(&self) -> f64 {
        self.signed_area_doubled().abs() / 2.0
    }
}

/// The simple-polygon decomposition of a glyph's contours.
///
/// Contours are pairwise non-crossing (they may nest or share isolated
/// vertices) and each is tagged fill or hole. The filled area is the fill
/// loops minus the hole loops.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedOutline {
    /// The resolved loops.
    pub contours: Vec<ResolvedContour>,
    rule: WindingRule,
}

impl ResolvedOutline {
    /// The fill rule the outline was resolved under.
    pub fn rule(&self) -> WindingRule {
        self.rule
    }

    /// Net filled area: fill loops minus hole loops.
    pub fn filled_area(&self) -> f64 {
        self.contours
            .iter()
            .map(|c| match c.class {
                FillClass::Fill => c.area(),
                FillClass::Hole => -c.area(),
            })
            .sum()
    }

    /// Whether `p` lies in the filled region.
    ///
    /// Used by raster-style consumers (signed distance generation) to pick
    /// the distance sign.
    pub fn contains(&self, p: Point) -> bool {
        let total: i32 = self
            .contours
            .iter()
            .map(|c| winding_number(&c.points, p))
            .sum();
        self.rule.is_filled(total)
    }
}

/// Decomposes closed contours into simple fill/hole loops.
///
/// Configured once at start-up; `resolve` may then be called per glyph.
#[derive(Clone, Debug)]
pub struct PolygonResolver {
    rule: WindingRule,
    epsilon: f64,
}

impl Default for PolygonResolver {
    fn default() -> Self {
        Self::new(WindingRule::NonZero)
    }
}

/// A directed edge: ring index plus the node holding the start vertex.
type EdgeRef = (usize, NodeId);

/// A directed boundary edge between two pool vertices, fill on its left.
type BoundaryEdge = (u32, u32);

/// Pending subdivisions of one edge: `(parameter, vertex index)`.
type SplitList = SmallVec<[(f64, u32); 2]>;

impl PolygonResolver {
    /// Creates a resolver with the given fill rule and default epsilon.
    pub fn new(rule: WindingRule) -> Self {
        Self {
            rule,
            epsilon: 1e-6,
        }
    }

    /// Overrides the coincidence epsilon.
    ///
    /// Points closer than this are welded to a single vertex. Must be
    /// positive and far below the glyph's feature size.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        debug_assert!(epsilon > 0.0, "epsilon must be positive");
        self.epsilon = epsilon;
        self
    }

    /// Resolves a glyph outline, flattening its contours at `tolerance`.
    pub fn resolve_outline(
        &self,
        outline: &GlyphOutline,
        tolerance: f64,
    ) -> Result<ResolvedOutline, Error> {
        let polylines: Vec<Vec<Point>> = outline
            .contours
            .iter()
            .map(|c| c.flatten(tolerance))
            .collect();
        self.resolve(polylines)
    }

    /// Resolves a set of closed polylines into simple fill/hole loops.
    ///
    /// Each polyline is a closed loop: the edge from its last point back to
    /// its first is implicit. Loops with fewer than three points are
    /// ignored.
    pub fn resolve(&self, polylines: Vec<Vec<Point>>) -> Result<ResolvedOutline, Error> {
        let mut graph = EdgeGraph::build(&polylines, self.epsilon);
        graph.split_at_intersections();
        let loops = graph.walk(self.rule)?;
        // The walk keeps fill on the left of travel, so orientation alone
        // classifies each loop.
        let contours = loops
            .into_iter()
            .map(|points| {
                let class = if signed_area_doubled(&points) >= 0.0 {
                    FillClass::Fill
                } else {
                    FillClass::Hole
                };
                ResolvedContour { points, class }
            })
            .collect();
        Ok(ResolvedOutline {
            contours,
            rule: self.rule,
        })
    }

    /// Classifies polylines without intersection resolution.
    ///
    /// This is the degraded path used when `resolve` reports
    /// [`ErrorKind::ResolutionFailed`]: the contours are treated as already
    /// simple and only fill/hole classification runs.
    ///
    /// [`ErrorKind::ResolutionFailed`]: crate::ErrorKind::ResolutionFailed
    pub fn assume_simple(&self, polylines: Vec<Vec<Point>>) -> ResolvedOutline {
        classify(polylines, self.rule, self.epsilon)
    }
}

/// The vertex pool plus one edge ring per input contour.
struct EdgeGraph {
    vertices: Vec<Point>,
    rings: Vec<EdgeRing<u32>>,
    epsilon: f64,
}

impl EdgeGraph {
    fn build(polylines: &[Vec<Point>], epsilon: f64) -> Self {
        let mut graph = Self {
            vertices: Vec::new(),
            rings: Vec::new(),
            epsilon,
        };
        for polyline in polylines {
            if polyline.len() < 3 {
                continue;
            }
            let mut ring = EdgeRing::new();
            for &p in polyline {
                let v = graph.vertex_index(p);
                // Welding can collapse consecutive points; skip the
                // resulting zero-length edges.
                if ring
                    .head()
                    .is_some_and(|h| *ring.value(ring.prev(h)) == v || *ring.value(h) == v)
                {
                    continue;
                }
                ring.push(v);
            }
            if ring.len() >= 3 {
                graph.rings.push(ring);
            }
        }
        graph
    }

    /// Index of `p` in the pool, welding to an existing vertex when one is
    /// within epsilon.
    fn vertex_index(&mut self, p: Point) -> u32 {
        for (i, &q) in self.vertices.iter().enumerate() {
            if q.distance(p) <= self.epsilon {
                return i as u32;
            }
        }
        self.vertices.push(p);
        (self.vertices.len() - 1) as u32
    }

    fn edge_points(&self, edge: EdgeRef) -> (Point, Point) {
        let (a, b) = self.edge_indices(edge);
        (self.vertices[a as usize], self.vertices[b as usize])
    }

    fn edge_indices(&self, (ring, node): EdgeRef) -> (u32, u32) {
        let r = &self.rings[ring];
        (*r.value(node), *r.value(r.next(node)))
    }

    /// Finds every pairwise edge intersection (including self-intersections
    /// within one ring) and splits the affected edges by inserting the
    /// intersection vertex into both rings.
    ///
    /// All intersections are computed against the pre-split edges and then
    /// applied in one pass, sorted by parameter along each edge, which keeps
    /// the scan deterministic and guarantees termination even for
    /// degenerate, exactly coincident edges.
    fn split_at_intersections(&mut self) {
        let edges: Vec<EdgeRef> = self
            .rings
            .iter()
            .enumerate()
            .flat_map(|(ri, ring)| ring.iter().map(move |(id, _)| (ri, id)).collect::<Vec<_>>())
            .collect();

        let mut splits: HashMap<EdgeRef, SplitList> = HashMap::new();
        for (i, &ea) in edges.iter().enumerate() {
            for &eb in &edges[i + 1..] {
                self.intersect_pair(ea, eb, &mut splits);
            }
        }

        for (&(ring, node), list) in &mut splits {
            let mut list = core::mem::take(list);
            list.sort_by(|a, b| a.0.total_cmp(&b.0));
            let (from, to) = self.edge_indices((ring, node));
            let mut cursor = node;
            let mut last = from;
            for (_, v) in list {
                if v == last || v == to {
                    continue;
                }
                cursor = self.rings[ring].insert_after(cursor, v);
                last = v;
            }
        }
    }

    /// Records the intersection of a single edge pair, if any.
    fn intersect_pair(
        &mut self,
        ea: EdgeRef,
        eb: EdgeRef,
        splits: &mut HashMap<EdgeRef, SplitList>,
    ) {
        let (a0i, a1i) = self.edge_indices(ea);
        let (b0i, b1i) = self.edge_indices(eb);
        // Edges sharing a welded vertex already meet at a pool vertex;
        // the junction needs no extra split.
        if a0i == b0i || a0i == b1i || a1i == b0i || a1i == b1i {
            return;
        }

        let (a0, a1) = self.edge_points(ea);
        let (b0, b1) = self.edge_points(eb);
        let da = a1 - a0;
        let db = b1 - b0;
        let denom = cross(da, db);

        if denom.abs() <= self.epsilon {
            // Parallel. Coincident overlapping edges are snapped to a
            // canonical ordering by splitting each edge at the other's
            // interior endpoints, so the walk always terminates.
            if cross(da, b0 - a0).abs() <= self.epsilon * da.hypot().max(1.0) {
                for (v, p) in [(b0i, b0), (b1i, b1)] {
                    if let Some(t) = interior_param(a0, a1, p, self.epsilon) {
                        splits.entry(ea).or_default().push((t, v));
                    }
                }
                for (v, p) in [(a0i, a0), (a1i, a1)] {
                    if let Some(t) = interior_param(b0, b1, p, self.epsilon) {
                        splits.entry(eb).or_default().push((t, v));
                    }
                }
            }
            return;
        }

        let ta = cross(b0 - a0, db) / denom;
        let tb = cross(b0 - a0, da) / denom;
        if !(-1e-12..=1.0 + 1e-12).contains(&ta) || !(-1e-12..=1.0 + 1e-12).contains(&tb) {
            return;
        }
        let p = a0 + ta * da;

        let near_a_end = p.distance(a0) <= self.epsilon || p.distance(a1) <= self.epsilon;
        let near_b_end = p.distance(b0) <= self.epsilon || p.distance(b1) <= self.epsilon;
        if near_a_end && near_b_end {
            // Endpoint touching endpoint is a welded vertex already.
            return;
        }

        if near_a_end {
            // T-junction: an endpoint of `a` lies inside `b`.
            let v = if p.distance(a0) <= self.epsilon {
                a0i
            } else {
                a1i
            };
            splits.entry(eb).or_default().push((tb, v));
        } else if near_b_end {
            let v = if p.distance(b0) <= self.epsilon {
                b0i
            } else {
                b1i
            };
            splits.entry(ea).or_default().push((ta, v));
        } else {
            // Proper crossing: one new vertex, inserted into both edges.
            let v = self.vertex_index(p);
            splits.entry(ea).or_default().push((ta, v));
            splits.entry(eb).or_default().push((tb, v));
        }
    }

    /// The directed boundary edges of the filled region under `rule`.
    ///
    /// Every split edge is sampled just left and just right of its midpoint
    /// against the winding of the whole outline. An edge survives only when
    /// exactly one side is filled, reversed if needed so the filled side is
    /// on its left. Exactly coincident duplicates (stacked contours) bound
    /// the same region once.
    fn boundary_edges(&self, rule: WindingRule) -> Vec<BoundaryEdge> {
        let polylines: Vec<Vec<Point>> = self
            .rings
            .iter()
            .map(|ring| {
                ring.iter()
                    .map(|(_, &v)| self.vertices[v as usize])
                    .collect()
            })
            .collect();
        let winding = |p: Point| -> i32 {
            polylines
                .iter()
                .map(|polyline| winding_number(polyline, p))
                .sum()
        };

        let mut kept = Vec::new();
        let mut seen: HashSet<BoundaryEdge> = HashSet::new();
        for ring in &self.rings {
            for (id, &from) in ring.iter() {
                let to = *ring.value(ring.next(id));
                let a = self.vertices[from as usize];
                let b = self.vertices[to as usize];
                let d = b - a;
                let len = d.hypot();
                if len <= self.epsilon {
                    continue;
                }
                // Unit normal pointing to the left of travel.
                let n = Vec2::new(-d.y, d.x) / len;
                let m = a.midpoint(b);
                let filled_left = rule.is_filled(winding(m + self.epsilon * n));
                let filled_right = rule.is_filled(winding(m - self.epsilon * n));
                let edge = match (filled_left, filled_right) {
                    (true, false) => (from, to),
                    (false, true) => (to, from),
                    // Interior to an overlap, or outside the fill entirely.
                    _ => continue,
                };
                if seen.insert(edge) {
                    kept.push(edge);
                }
            }
        }
        kept
    }

    /// Links the boundary edges of the filled region into closed loops.
    ///
    /// Every kept edge carries fill on its left, so each belongs to the
    /// boundary of exactly one filled region and the loops come out simple:
    /// counter-clockwise around fill, clockwise around holes. A ring with no
    /// junctions and no overlap is kept whole, so simple input contours
    /// resolve to themselves.
    fn walk(&self, rule: WindingRule) -> Result<Vec<Vec<Point>>, Error> {
        let kept = self.boundary_edges(rule);
        let mut outgoing: HashMap<u32, SmallVec<[BoundaryEdge; 2]>> = HashMap::new();
        for &edge in &kept {
            outgoing.entry(edge.0).or_default().push(edge);
        }

        let mut consumed: HashSet<BoundaryEdge> = HashSet::with_capacity(kept.len());
        let mut loops: Vec<Vec<Point>> = Vec::new();
        for &start in &kept {
            if consumed.contains(&start) {
                continue;
            }
            if let Some(points) = self.trace_loop(start, &outgoing, &mut consumed, kept.len())? {
                if points.len() >= 3 {
                    loops.push(points);
                }
            }
        }
        Ok(loops)
    }

    /// Follows one boundary loop starting at `start`.
    ///
    /// Returns `None` when every continuation at some vertex is already
    /// consumed by an earlier loop, which only happens for numerically
    /// degenerate topology; the partial loop's edges stay consumed so the
    /// walk still terminates.
    fn trace_loop(
        &self,
        start: BoundaryEdge,
        outgoing: &HashMap<u32, SmallVec<[BoundaryEdge; 2]>>,
        consumed: &mut HashSet<BoundaryEdge>,
        total_edges: usize,
    ) -> Result<Option<Vec<Point>>, Error> {
        let mut points = Vec::new();
        let mut edge = start;
        let mut steps = 0_usize;

        loop {
            steps += 1;
            if steps > total_edges + 1 {
                return Err(Error::resolution_failed());
            }
            consumed.insert(edge);
            points.push(self.vertices[edge.0 as usize]);

            let Some(next) = self.successor(edge, outgoing, start, consumed) else {
                return Ok(None);
            };
            if next == start {
                return Ok(Some(points));
            }
            edge = next;
        }
    }

    /// The boundary edge following `edge` in loop order.
    ///
    /// At a plain vertex this is the single continuation; at a junction the
    /// sharpest counter-clockwise turn wins, which stays on the boundary of
    /// the filled region adjacent to the incoming edge's left instead of
    /// crossing into a neighboring one. Edges claimed by earlier loops are
    /// skipped, except the trace's own start edge, which closes the loop.
    fn successor(
        &self,
        edge: BoundaryEdge,
        outgoing: &HashMap<u32, SmallVec<[BoundaryEdge; 2]>>,
        start: BoundaryEdge,
        consumed: &HashSet<BoundaryEdge>,
    ) -> Option<BoundaryEdge> {
        let candidates = outgoing.get(&edge.1)?;
        if candidates.len() == 1 {
            let only = candidates[0];
            return (only == start || !consumed.contains(&only)).then_some(only);
        }
        let origin = self.vertices[edge.1 as usize];
        let incoming = origin - self.vertices[edge.0 as usize];

        let mut ranked: SmallVec<[(f64, u32, BoundaryEdge); 4]> = candidates
            .iter()
            .map(|&candidate| {
                let dir = self.vertices[candidate.1 as usize] - origin;
                (ccw_turn(incoming, dir), candidate.1, candidate)
            })
            .collect();
        // Sharpest counter-clockwise turn first; exact ties (coincident fan
        // edges) break on end-vertex index, then declaration order.
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        ranked
            .into_iter()
            .map(|(_, _, e)| e)
            .find(|e| *e == start || !consumed.contains(e))
    }
}

/// Counter-clockwise turn from `incoming` to `dir`, in `[0, 2*pi)`.
///
/// Straight ahead maps to zero and ranks sharpest of all; a collinear
/// continuation perturbed by intersection arithmetic must not fall to the
/// far end of the range, hence the snap.
fn ccw_turn(incoming: Vec2, dir: Vec2) -> f64 {
    let angle = cross(incoming, dir).atan2(incoming.dot(dir));
    if angle < -1e-9 {
        angle + core::f64::consts::TAU
    } else {
        angle.max(0.0)
    }
}

/// Evaluates each loop's winding just inside and just outside its boundary,
/// drops loops where the filled state does not change, and tags the rest
/// fill or hole.
///
/// This is the classification for loops taken as already simple (the
/// degraded path); the main path classifies by traced orientation instead.
fn classify(loops: Vec<Vec<Point>>, rule: WindingRule, epsilon: f64) -> ResolvedOutline {
    let mut contours = Vec::new();
    for (i, points) in loops.iter().enumerate() {
        if points.len() < 3 {
            continue;
        }
        let orientation = if signed_area_doubled(points) >= 0.0 {
            1
        } else {
            -1
        };
        let sample = edge_sample_point(points, &loops, i, epsilon);
        // Winding contributed by every other loop at a point on this
        // loop's boundary; the loop itself adds its orientation on the
        // inside and nothing on the outside.
        let outside: i32 = loops
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, other)| winding_number(other, sample))
            .sum();
        let inside = outside + orientation;

        let filled_inside = rule.is_filled(inside);
        let filled_outside = rule.is_filled(outside);
        if filled_inside == filled_outside {
            // Not a boundary of the filled region.
            continue;
        }
        contours.push(ResolvedContour {
            points: points.clone(),
            class: if filled_inside {
                FillClass::Fill
            } else {
                FillClass::Hole
            },
        });
    }
    ResolvedOutline { contours, rule }
}

/// A point on loop `i`'s boundary that does not lie on any other loop.
///
/// Edge midpoints are tried longest-first; resolved loops only share
/// isolated vertices, so one of them is always clear of the other loops.
fn edge_sample_point(points: &[Point], loops: &[Vec<Point>], skip: usize, epsilon: f64) -> Point {
    let mut edges: Vec<usize> = (0..points.len()).collect();
    edges.sort_by(|&a, &b| {
        let la = points[a].distance(points[(a + 1) % points.len()]);
        let lb = points[b].distance(points[(b + 1) % points.len()]);
        lb.total_cmp(&la)
    });
    for &e in &edges {
        let m = points[e].midpoint(points[(e + 1) % points.len()]);
        let clear = loops
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != skip)
            .all(|(_, other)| !point_on_polygon(other, m, epsilon));
        if clear {
            return m;
        }
    }
    points[0].midpoint(points[1 % points.len()])
}

fn point_on_polygon(points: &[Point], p: Point, epsilon: f64) -> bool {
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        let ab = b - a;
        let len2 = ab.hypot2();
        if len2 == 0.0 {
            continue;
        }
        let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
        if (a + t * ab).distance(p) <= epsilon {
            return true;
        }
    }
    false
}

/// Signed winding number of a closed polyline around `p`.
pub(crate) fn winding_number(points: &[Point], p: Point) -> i32 {
    let mut winding = 0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        if a.y <= p.y {
            if b.y > p.y && cross(b - a, p - a) > 0.0 {
                winding += 1;
            }
        } else if b.y <= p.y && cross(b - a, p - a) < 0.0 {
            winding -= 1;
        }
    }
    winding
}

fn cross(a: Vec2, b: Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Parameter of `p` along `a0..a1` when strictly between the endpoints.
fn interior_param(a0: Point, a1: Point, p: Point, epsilon: f64) -> Option<f64> {
    let d = a1 - a0;
    let len2 = d.hypot2();
    if len2 == 0.0 {
        return None;
    }
    let t = (p - a0).dot(d) / len2;
    if t <= 0.0 || t >= 1.0 {
        return None;
    }
    if p.distance(a0) <= epsilon || p.distance(a1) <= epsilon {
        return None;
    }
    ((a0 + t * d).distance(p) <= epsilon).then_some(t)
}
