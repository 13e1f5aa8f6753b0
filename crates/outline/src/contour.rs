use std::ops::RangeInclusive;

use log::debug;
use penscript_core::{Point, Stroke};

/// Number of line segments used to approximate each curve segment.
pub const CURVE_STEPS: usize = 4;

/// Consecutive points closer than this (in em units) are merged.
pub const DEDUP_EPSILON: f32 = 1e-3;

/// Any normalized coordinate outside this range invalidates its sub-path.
pub const SANITY_RANGE: RangeInclusive<f32> = -1.0..=2.0;

/// Collects contour commands from a font outline into em-normalized strokes.
///
/// Curves are flattened into [CURVE_STEPS] line segments each. A closed
/// contour ends with a copy of its starting point so the pen returns to it.
#[derive(Debug)]
pub struct ContourCollector {
    scale: f32,
    strokes: Vec<Stroke>,
    current: Vec<Point>,
    start: Point,
    pen: Point,
    rejected: bool,
    discarded: usize,
}

impl ContourCollector {
    pub fn new(units_per_em: f32) -> Self {
        Self {
            scale: 1.0 / units_per_em,
            strokes: Vec::new(),
            current: Vec::new(),
            start: Point::default(),
            pen: Point::default(),
            rejected: false,
            discarded: 0,
        }
    }

    /// Number of sub-paths thrown away for containing out-of-range points.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Finish the outline and return the collected strokes.
    pub fn finish(mut self) -> Vec<Stroke> {
        self.flush();
        self.strokes
    }

    fn normalize(&self, x: f32, y: f32) -> Point {
        Point::new(x * self.scale, y * self.scale)
    }

    fn push(&mut self, point: Point) {
        self.pen = point;

        if !SANITY_RANGE.contains(&point.x) || !SANITY_RANGE.contains(&point.y) {
            self.rejected = true;
        }

        if let Some(last) = self.current.last()
            && (last.x - point.x).hypot(last.y - point.y) < DEDUP_EPSILON
        {
            return;
        }

        self.current.push(point);
    }

    fn flush(&mut self) {
        let points = std::mem::take(&mut self.current);

        if self.rejected {
            debug!("Discarding sub-path with out-of-range points");
            self.discarded += 1;
        } else if points.len() >= 2 {
            self.strokes.push(Stroke::new(points));
        }

        self.rejected = false;
    }
}

fn lerp(a: Point, b: Point, t: f32) -> Point {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

impl ttf_parser::OutlineBuilder for ContourCollector {
    fn move_to(&mut self, x: f32, y: f32) {
        self.flush();
        let point = self.normalize(x, y);
        self.start = point;
        self.push(point);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let point = self.normalize(x, y);
        self.push(point);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let from = self.pen;
        let ctrl = self.normalize(x1, y1);
        let to = self.normalize(x, y);

        for step in 1..=CURVE_STEPS {
            let t = step as f32 / CURVE_STEPS as f32;
            self.push(lerp(lerp(from, ctrl, t), lerp(ctrl, to, t), t));
        }
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let from = self.pen;
        let ctrl1 = self.normalize(x1, y1);
        let ctrl2 = self.normalize(x2, y2);
        let to = self.normalize(x, y);

        for step in 1..=CURVE_STEPS {
            let t = step as f32 / CURVE_STEPS as f32;
            let a = lerp(from, ctrl1, t);
            let b = lerp(ctrl1, ctrl2, t);
            let c = lerp(ctrl2, to, t);
            self.push(lerp(lerp(a, b, t), lerp(b, c, t), t));
        }
    }

    fn close(&mut self) {
        let start = self.start;
        self.push(start);
        self.flush();
    }
}
