#![no_std]

//! `penscript-core` provides core primitives for the `penscript` crates.
//!
//! Glyph geometry lives in the unit em-square with the y axis pointing up from
//! the baseline. Everything downstream of layout ([PlotPath]) is expressed in a
//! target space: preview pixels or plotter millimetres.

use alloc::vec::Vec;

extern crate alloc;

/// A 2-D point.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// An ordered polyline belonging to a glyph outline.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Stroke {
    points: Vec<Point>,
}

impl Stroke {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Points of this stroke, in em-square units.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl<P: Into<Point>> FromIterator<P> for Stroke {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// A single glyph (character) contained within a font.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Glyph {
    strokes: Vec<Stroke>,
}

impl Glyph {
    pub fn new(strokes: Vec<Stroke>) -> Self {
        Self { strokes }
    }

    /// A glyph with no strokes, e.g. the space character.
    pub const fn blank() -> Self {
        Self {
            strokes: Vec::new(),
        }
    }

    /// Series of strokes which make up this glyph.
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn is_blank(&self) -> bool {
        self.strokes.is_empty()
    }
}

/// Raised when a path does not have enough points to be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("a plot path needs at least 2 points, got {points}")]
pub struct PathValidationError {
    pub points: usize,
}

/// A drawable polyline in a target coordinate space.
///
/// Constructing through [PlotPath::new] guarantees at least two points. Paths
/// that arrive from elsewhere (for example deserialized) are checked again by
/// the plot executor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PlotPath {
    points: Vec<Point>,
}

impl PlotPath {
    pub fn new(points: Vec<Point>) -> Result<Self, PathValidationError> {
        if points.len() < 2 {
            return Err(PathValidationError {
                points: points.len(),
            });
        }
        Ok(Self { points })
    }

    /// A straight two-point segment.
    pub fn segment(from: Point, to: Point) -> Self {
        Self {
            points: alloc::vec![from, to],
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<Point> {
        self.points.first().copied()
    }
}

impl TryFrom<Vec<Point>> for PlotPath {
    type Error = PathValidationError;

    fn try_from(points: Vec<Point>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

/// The safe rectangle, in millimetres, within which a plotter may move its pen.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkspaceBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl WorkspaceBounds {
    /// Drawing area of an AxiDraw Mini.
    pub const AXIDRAW_MINI: Self = Self {
        min_x: 0.0,
        max_x: 150.0,
        min_y: 0.0,
        max_y: 100.0,
    };

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Is the point inside the rectangle, edges included?
    pub fn contains(&self, point: Point) -> bool {
        (self.min_x..=self.max_x).contains(&point.x) && (self.min_y..=self.max_y).contains(&point.y)
    }

    /// Clamp a point into the rectangle, reporting whether it had to move.
    ///
    /// Never panics, even for inverted or NaN bounds.
    pub fn clamp(&self, point: Point) -> (Point, bool) {
        let clamped = Point {
            x: point.x.max(self.min_x).min(self.max_x),
            y: point.y.max(self.min_y).min(self.max_y),
        };
        (clamped, clamped != point)
    }
}

impl Default for WorkspaceBounds {
    fn default() -> Self {
        Self::AXIDRAW_MINI
    }
}

/// A table of glyphs that layout can draw from.
///
/// Lookups never fail: implementors return a fallback shape for characters
/// they do not know.
pub trait GlyphSource {
    /// The glyph for `character`, or the fallback glyph.
    fn glyph(&self, character: char) -> &Glyph;

    /// Strokes for `character`, in em-square units.
    fn strokes_for(&self, character: char) -> &[Stroke] {
        self.glyph(character).strokes()
    }
}
