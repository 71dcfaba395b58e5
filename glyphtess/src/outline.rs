// Copyright 2026 the Glyphtess Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The normalized outline model: segments, contours and glyph outlines.
//!
//! Outlines are built through [`OutlineBuilder`], a command sink with the
//! same shape as a font library's outline decomposition callbacks. With the
//! `skrifa` feature enabled the builder can be used directly as a
//! [`skrifa::outline::OutlinePen`].

use kurbo::{Point, Rect};

use crate::flatten::{flatten_cubic, flatten_quad};
use crate::Error;

/// Distance below which two outline points are considered the same vertex.
///
/// Font units are integers in the thousands, so this is far below any
/// drawable feature while absorbing exact-duplicate points emitted by
/// outline decomposition.
pub(crate) const WELD_EPSILON: f64 = 1e-6;

/// One element of a contour.
///
/// The start point is implicit: it is the end point of the previous segment
/// (or the contour's start point for the first segment).
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Segment {
    /// A straight edge to `to`.
    Line {
        /// End point.
        to: Point,
    },
    /// A quadratic Bézier with one control point.
    Quad {
        /// Control point.
        ctrl: Point,
        /// End point.
        to: Point,
    },
    /// A cubic Bézier with two control points.
    Cubic {
        /// First control point.
        ctrl0: Point,
        /// Second control point.
        ctrl1: Point,
        /// End point.
        to: Point,
    },
}

impl Segment {
    /// The end point of this segment.
    pub fn end(&self) -> Point {
        match *self {
            Self::Line { to } | Self::Quad { to, .. } | Self::Cubic { to, .. } => to,
        }
    }
}

/// One closed loop of a glyph outline.
#[derive(Clone, Debug, PartialEq)]
pub struct Contour {
    /// The point the contour starts (and ends) at.
    pub start: Point,
    /// The segments forming the loop. The last segment ends at `start`.
    pub segments: Vec<Segment>,
}

impl Contour {
    /// Whether the final segment returns to the start point.
    pub fn is_closed(&self) -> bool {
        match self.segments.last() {
            Some(seg) => seg.end().distance(self.start) <= WELD_EPSILON,
            None => false,
        }
    }

    /// Flattens the contour into a closed polyline at the given tolerance.
    ///
    /// The returned points are the polygon vertices in order; the edge from
    /// the last point back to the first closes the loop implicitly. The
    /// closing duplicate of the start point is not included.
    pub fn flatten(&self, tolerance: f64) -> Vec<Point> {
        let mut pts = vec![self.start];
        let mut last = self.start;
        for seg in &self.segments {
            match *seg {
                Segment::Line { to } => pts.push(to),
                Segment::Quad { ctrl, to } => flatten_quad(last, ctrl, to, tolerance, &mut pts),
                Segment::Cubic { ctrl0, ctrl1, to } => {
                    flatten_cubic(last, ctrl0, ctrl1, to, tolerance, &mut pts);
                }
            }
            last = seg.end();
        }
        // Drop the closing duplicate so consecutive points are all distinct
        // edges and last -> first closes the loop.
        if pts.len() > 1 && pts.last().unwrap().distance(pts[0]) <= WELD_EPSILON {
            pts.pop();
        }
        pts
    }

    /// Twice the signed area of the flattened contour.
    ///
    /// Positive for counter-clockwise loops in a y-up coordinate system.
    /// Orientation is computed from the data, never assumed.
    pub fn signed_area_doubled(&self, tolerance: f64) -> f64 {
        signed_area_doubled(&self.flatten(tolerance))
    }
}

/// Twice the signed area of a closed polyline (shoelace formula).
pub(crate) fn signed_area_doubled(pts: &[Point]) -> f64 {
    let mut sum = 0.0;
    for (i, a) in pts.iter().enumerate() {
        let b = pts[(i + 1) % pts.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum
}

/// Horizontal metrics of a glyph, in font units.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct GlyphMetrics {
    /// How far the pen advances horizontally after this glyph.
    pub advance_x: f32,
    /// How far the pen advances vertically (zero for horizontal layouts).
    pub advance_y: f32,
    /// Offset from the pen position to the left edge of the glyph.
    pub bearing_x: f32,
    /// Offset from the baseline to the top edge of the glyph.
    pub bearing_y: f32,
}

/// A glyph's boundary: a set of closed contours plus metrics.
///
/// Immutable once produced by [`OutlineBuilder::finish`].
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphOutline {
    /// The font-specific glyph index this outline was extracted for.
    pub glyph_id: u32,
    /// The closed loops of the boundary.
    pub contours: Vec<Contour>,
    /// Horizontal metrics.
    pub metrics: GlyphMetrics,
}

impl GlyphOutline {
    /// Whether the glyph has no drawable geometry (e.g. a space).
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// The tight bounding box of all contour points.
    ///
    /// Control points are included; the true curve never leaves its control
    /// hull, so the box is conservative and stable across tolerances.
    pub fn bounding_box(&self) -> Rect {
        let mut bbox: Option<Rect> = None;
        let mut add = |p: Point| {
            bbox = Some(match bbox {
                Some(r) => r.union_pt(p),
                None => Rect::from_points(p, p),
            });
        };
        for contour in &self.contours {
            add(contour.start);
            for seg in &contour.segments {
                match *seg {
                    Segment::Line { to } => add(to),
                    Segment::Quad { ctrl, to } => {
                        add(ctrl);
                        add(to);
                    }
                    Segment::Cubic { ctrl0, ctrl1, to } => {
                        add(ctrl0);
                        add(ctrl1);
                        add(to);
                    }
                }
            }
        }
        bbox.unwrap_or(Rect::ZERO)
    }

    /// The four corners of the bounding box:
    /// bottom-left, top-left, top-right, bottom-right.
    pub fn bounding_quad(&self) -> [Point; 4] {
        let b = self.bounding_box();
        [
            Point::new(b.x0, b.y0),
            Point::new(b.x0, b.y1),
            Point::new(b.x1, b.y1),
            Point::new(b.x1, b.y0),
        ]
    }
}

/// Builds a [`GlyphOutline`] from move/line/quad/cubic/close commands.
///
/// The command shape matches font outline decomposition callbacks, so a
/// parser can drive the builder directly while walking a glyph's charstring
/// or `glyf` entry.
#[derive(Debug)]
pub struct OutlineBuilder {
    glyph_id: u32,
    metrics: GlyphMetrics,
    contours: Vec<Contour>,
    current: Option<Contour>,
    error: Option<Error>,
}

impl OutlineBuilder {
    /// Creates a builder for the given glyph index.
    pub fn new(glyph_id: u32) -> Self {
        Self {
            glyph_id,
            metrics: GlyphMetrics::default(),
            contours: Vec::new(),
            current: None,
            error: None,
        }
    }

    /// Sets the glyph metrics recorded on the finished outline.
    pub fn metrics(mut self, metrics: GlyphMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Starts a new contour at `p`, finishing the previous one.
    pub fn move_to(&mut self, p: Point) {
        self.end_contour();
        self.current = Some(Contour {
            start: p,
            segments: Vec::new(),
        });
    }

    /// Appends a straight edge.
    pub fn line_to(&mut self, p: Point) {
        if let Some(contour) = &mut self.current {
            contour.segments.push(Segment::Line { to: p });
        }
    }

    /// Appends a quadratic Bézier.
    pub fn quad_to(&mut self, ctrl: Point, p: Point) {
        if let Some(contour) = &mut self.current {
            contour.segments.push(Segment::Quad { ctrl, to: p });
        }
    }

    /// Appends a cubic Bézier.
    pub fn curve_to(&mut self, ctrl0: Point, ctrl1: Point, p: Point) {
        if let Some(contour) = &mut self.current {
            contour.segments.push(Segment::Cubic { ctrl0, ctrl1, to: p });
        }
    }

    /// Closes the current contour, adding the closing edge if the pen is
    /// not already back at the start point.
    pub fn close(&mut self) {
        if let Some(contour) = &mut self.current {
            if let Some(last) = contour.segments.last() {
                if last.end().distance(contour.start) > WELD_EPSILON {
                    contour.segments.push(Segment::Line { to: contour.start });
                }
            }
        }
    }

    /// Finishes the outline.
    ///
    /// Returns an error if any contour with geometry was left open; a
    /// malformed contour is reported, never silently repaired. Contours
    /// with no segments at all (anchor points) are dropped.
    pub fn finish(mut self) -> Result<GlyphOutline, Error> {
        self.end_contour();
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(GlyphOutline {
            glyph_id: self.glyph_id,
            contours: self.contours,
            metrics: self.metrics,
        })
    }

    fn end_contour(&mut self) {
        let Some(contour) = self.current.take() else {
            return;
        };
        if contour.segments.is_empty() {
            // A bare move_to, closed or not, carries no geometry. Fonts
            // emit these as anchor points for mark attachment; they are
            // dropped, the same way decomposition callbacks drop them when
            // the next move_to arrives.
            return;
        }
        if !contour.is_closed() {
            self.record_error(Error::open_contour(self.contours.len()));
            return;
        }
        self.contours.push(contour);
    }

    fn record_error(&mut self, err: Error) {
        // First structural failure wins; later contours cannot un-break
        // the glyph.
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

#[cfg(feature = "skrifa")]
impl skrifa::outline::OutlinePen for OutlineBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        Self::move_to(self, Point::new(x as f64, y as f64));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        Self::line_to(self, Point::new(x as f64, y as f64));
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        Self::quad_to(
            self,
            Point::new(cx0 as f64, cy0 as f64),
            Point::new(x as f64, y as f64),
        );
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        Self::curve_to(
            self,
            Point::new(cx0 as f64, cy0 as f64),
            Point::new(cx1 as f64, cy1 as f64),
            Point::new(x as f64, y as f64),
        );
    }

    fn close(&mut self) {
        Self::close(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn unit_square(builder: &mut OutlineBuilder) {
        builder.move_to(Point::new(0.0, 0.0));
        builder.line_to(Point::new(1.0, 0.0));
        builder.line_to(Point::new(1.0, 1.0));
        builder.line_to(Point::new(0.0, 1.0));
        builder.close();
    }

    #[test]
    fn builds_closed_square() {
        let mut builder = OutlineBuilder::new(7);
        unit_square(&mut builder);
        let outline = builder.finish().unwrap();
        assert_eq!(outline.glyph_id, 7);
        assert_eq!(outline.contours.len(), 1);
        assert!(outline.contours[0].is_closed());
        // close() added the edge back to the start.
        assert_eq!(outline.contours[0].segments.len(), 4);
    }

    #[test]
    fn open_contour_is_an_error() {
        let mut builder = OutlineBuilder::new(0);
        builder.move_to(Point::new(0.0, 0.0));
        builder.line_to(Point::new(1.0, 0.0));
        builder.line_to(Point::new(1.0, 1.0));
        // No close, endpoints differ.
        let err = builder.finish().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OpenContour);
        assert_eq!(err.contour(), Some(0));
    }

    #[test]
    fn anchor_point_contour_is_dropped() {
        // move_to followed by close with no segments: fonts carry these as
        // attachment anchors. The glyph's real contours must survive.
        let mut builder = OutlineBuilder::new(0);
        builder.move_to(Point::new(100.0, 100.0));
        builder.close();
        unit_square(&mut builder);
        let outline = builder.finish().unwrap();
        assert_eq!(outline.contours.len(), 1);

        // An unclosed bare move_to is dropped the same way.
        let mut builder = OutlineBuilder::new(0);
        builder.move_to(Point::new(100.0, 100.0));
        let outline = builder.finish().unwrap();
        assert!(outline.is_empty());
    }

    #[test]
    fn geometrically_closed_contour_needs_no_close() {
        let mut builder = OutlineBuilder::new(0);
        builder.move_to(Point::new(0.0, 0.0));
        builder.line_to(Point::new(1.0, 0.0));
        builder.line_to(Point::new(0.0, 0.0));
        assert!(builder.finish().is_ok());
    }

    #[test]
    fn flatten_drops_closing_duplicate() {
        let mut builder = OutlineBuilder::new(0);
        unit_square(&mut builder);
        let outline = builder.finish().unwrap();
        let pts = outline.contours[0].flatten(0.1);
        assert_eq!(pts.len(), 4);
    }

    #[test]
    fn orientation_is_computed() {
        let mut builder = OutlineBuilder::new(0);
        unit_square(&mut builder);
        let outline = builder.finish().unwrap();
        // x right, y up: this square is counter-clockwise.
        assert!(outline.contours[0].signed_area_doubled(0.1) > 0.0);
    }

    #[test]
    fn bounding_box_covers_control_points() {
        let mut builder = OutlineBuilder::new(0);
        builder.move_to(Point::new(0.0, 0.0));
        builder.quad_to(Point::new(5.0, 10.0), Point::new(10.0, 0.0));
        builder.close();
        let outline = builder.finish().unwrap();
        assert_eq!(outline.bounding_box(), Rect::new(0.0, 0.0, 10.0, 10.0));
    }
}
