//! Mapping from em-square glyph coordinates into preview or plotter space.
//!
//! Layout works in a y-down frame. A [Cursor] marks the top-left corner of
//! the glyph cell being placed, and the glyph's em-square (y up from the
//! baseline) is scaled onto it. Plotter space flips the vertical axis so that
//! the first line lands at the top of the workspace.

use log::debug;
use penscript_core::{Point, WorkspaceBounds};

/// Points per inch.
const POINTS_PER_INCH: f32 = 72.0;
const MM_PER_INCH: f32 = 25.4;

/// Top-left corner of a glyph cell in layout units.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Cursor {
    pub x: f32,
    pub y: f32,
}

impl Cursor {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An on-screen preview page, measured in pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PreviewPage {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    /// Pixels per inch, used to size fonts given in points.
    pub dpi: f32,
}

impl Default for PreviewPage {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 800.0,
            margin: 100.0,
            dpi: 100.0,
        }
    }
}

/// The drawable rectangle of a target space, in layout units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    pub origin: Cursor,
    pub width: f32,
    pub height: f32,
}

/// Where layout output is headed.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TargetSpace {
    /// Unclamped screen pixels, y pointing down.
    Preview(PreviewPage),
    /// Plotter millimetres, y pointing up, clamped to `bounds`.
    Physical {
        bounds: WorkspaceBounds,
        margin: f32,
    },
}

impl TargetSpace {
    /// The default preview page.
    pub fn preview() -> Self {
        Self::Preview(PreviewPage::default())
    }

    /// A plotter workspace with a 10 mm margin.
    pub fn physical(bounds: WorkspaceBounds) -> Self {
        Self::Physical {
            bounds,
            margin: 10.0,
        }
    }

    /// Target units per typographic point.
    pub fn units_per_point(&self) -> f32 {
        match self {
            Self::Preview(page) => page.dpi / POINTS_PER_INCH,
            Self::Physical { .. } => MM_PER_INCH / POINTS_PER_INCH,
        }
    }

    /// The area text may occupy once margins are removed.
    pub fn frame(&self) -> Frame {
        match self {
            Self::Preview(page) => Frame {
                origin: Cursor::new(page.margin, page.margin),
                width: (page.width - 2.0 * page.margin).max(0.0),
                height: (page.height - 2.0 * page.margin).max(0.0),
            },
            Self::Physical { bounds, margin } => Frame {
                origin: Cursor::new(bounds.min_x + margin, *margin),
                width: (bounds.width() - 2.0 * margin).max(0.0),
                height: (bounds.height() - 2.0 * margin).max(0.0),
            },
        }
    }

    /// Map a normalized glyph point placed at `cursor` into this space.
    pub fn place(&self, norm: Point, cursor: Cursor, scale: f32) -> Point {
        match self {
            Self::Preview(_) => to_preview(norm, cursor, scale),
            Self::Physical { bounds, .. } => to_physical(norm, cursor, scale, bounds),
        }
    }
}

/// Map into preview pixels. Never clamped.
pub fn to_preview(norm: Point, cursor: Cursor, scale: f32) -> Point {
    Point::new(cursor.x + norm.x * scale, cursor.y + (1.0 - norm.y) * scale)
}

/// Map into plotter millimetres, clamping into `bounds`.
pub fn to_physical(norm: Point, cursor: Cursor, scale: f32, bounds: &WorkspaceBounds) -> Point {
    let point = Point::new(
        cursor.x + norm.x * scale,
        bounds.max_y - (cursor.y + (1.0 - norm.y) * scale),
    );

    let (clamped, moved) = bounds.clamp(point);
    if moved {
        debug!(
            "Clamped ({:.2}, {:.2}) to ({:.2}, {:.2})",
            point.x, point.y, clamped.x, clamped.y
        );
    }
    clamped
}
