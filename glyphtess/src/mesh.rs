// Copyright 2026 the Glyphtess Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-glyph geometry artifact produced by tessellation.

use bytemuck::{Pod, Zeroable};
use kurbo::Point;

/// A single mesh vertex in font units.
///
/// Plain-old-data so vertex buffers can be handed to a GPU upload path with
/// [`bytemuck::cast_slice`].
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    /// Horizontal position.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
}

impl MeshVertex {
    /// Creates a vertex.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<Point> for MeshVertex {
    fn from(p: Point) -> Self {
        Self {
            x: p.x as f32,
            y: p.y as f32,
        }
    }
}

/// A quadratic curve patch as three indices into the vertex buffer.
///
/// The control points are preserved losslessly; a GPU tessellation stage
/// re-evaluates the curve at draw time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CurvePatch {
    /// Index of the start point.
    pub start: u32,
    /// Index of the control point.
    pub control: u32,
    /// Index of the end point.
    pub end: u32,
}

/// A signed-distance bitmap covering a glyph's bounding box.
///
/// Distances are stored as unsigned bytes with 128 on the outline, larger
/// values inside the fill and smaller outside, matching the usual SDF
/// texture convention.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SdfBitmap {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Row-major distance values, `width * height` bytes.
    pub data: Vec<u8>,
}

impl SdfBitmap {
    /// The distance value at `(x, y)`.
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[(y * self.width + x) as usize]
    }

    /// Whether the texel at `(x, y)` is inside the fill.
    pub fn is_inside(&self, x: u32, y: u32) -> bool {
        self.get(x, y) >= 128
    }
}

/// Strategy-specific companion data of a [`GlyphMesh`].
#[derive(Clone, Debug, PartialEq)]
pub enum MeshPayload {
    /// The index buffer alone describes the glyph as a triangle list.
    Triangles,
    /// The index buffer triangulates the inner polygon; the patches carry
    /// the unflattened curve control points for the GPU stage.
    Patches {
        /// One patch per quadratic boundary segment.
        patches: Vec<CurvePatch>,
    },
    /// The index buffer is the glyph's bounding quad; the bitmap is sampled
    /// across it.
    Sdf {
        /// The signed-distance bitmap, destined for the font atlas.
        bitmap: SdfBitmap,
    },
    /// The index buffer is the glyph's bounding quad; the segment index
    /// buffers feed the per-pixel winding evaluation in the shader.
    Winding {
        /// Pairs of vertex indices, one pair per line segment.
        line_indices: Vec<u32>,
        /// Triples of vertex indices (start, control, end), one per
        /// quadratic segment.
        curve_indices: Vec<u32>,
    },
}

/// Draw-ready glyph geometry: a vertex buffer, an index buffer and the
/// strategy-specific payload.
///
/// Immutable once built; the glyph cache hands out shared references and
/// the GPU upload path reads the buffers as raw bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphMesh {
    /// Vertex buffer in font units.
    pub vertices: Vec<MeshVertex>,
    /// Primary index buffer; its meaning depends on the payload.
    pub indices: Vec<u32>,
    /// Strategy-specific companion data.
    pub payload: MeshPayload,
}

impl GlyphMesh {
    /// An empty placeholder mesh.
    ///
    /// Stands in for glyphs whose outline failed structurally, so a bad
    /// glyph renders as nothing instead of aborting the frame.
    pub fn placeholder() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            payload: MeshPayload::Triangles,
        }
    }

    /// Whether the mesh draws nothing.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The vertex buffer as raw bytes for GPU upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// The index buffer as raw bytes for GPU upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
