// Copyright 2026 the Glyphtess Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Error produced while building or resolving a glyph outline.
///
/// Carries a non-exhaustive [`ErrorKind`] plus the index of the contour the
/// failure was detected in, when one is known. A structural error is fatal
/// for the affected glyph only; callers are expected to substitute a
/// placeholder mesh and keep rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    /// The machine-readable category describing this error.
    kind: ErrorKind,

    /// Index of the offending contour within the glyph, if known.
    contour: Option<usize>,
}

impl Error {
    /// The machine-readable category for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Index of the offending contour within the glyph, if known.
    pub fn contour(&self) -> Option<usize> {
        self.contour
    }

    pub(crate) fn open_contour(contour: usize) -> Self {
        Self {
            kind: ErrorKind::OpenContour,
            contour: Some(contour),
        }
    }

    pub(crate) fn resolution_failed() -> Self {
        Self {
            kind: ErrorKind::ResolutionFailed,
            contour: None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            ErrorKind::OpenContour => match self.contour {
                Some(i) => write!(f, "contour {i} is not closed"),
                None => write!(f, "contour is not closed"),
            },
            ErrorKind::ResolutionFailed => {
                write!(f, "polygon resolution produced inconsistent winding")
            }
        }
    }
}

impl core::error::Error for Error {}

/// The non-exhaustive category of an outline error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A contour's last point did not return to its first point.
    OpenContour,

    /// The polygon resolver could not produce a consistent decomposition.
    ///
    /// This is a bug signal; callers fall back to treating the input
    /// contours as already simple.
    ResolutionFailed,
}
