//! A minimal glyph set for development without a real font file.

use penscript_core::{Glyph, Stroke};

/// Width of a box glyph cell, in em units.
pub const CELL_WIDTH: f32 = 0.75;

fn stroke(points: &[(f32, f32)]) -> Stroke {
    points.iter().copied().collect()
}

fn outline_box(width: f32, height: f32) -> Glyph {
    Glyph::new(vec![stroke(&[
        (0.0, 0.0),
        (width, 0.0),
        (width, height),
        (0.0, height),
        (0.0, 0.0),
    ])])
}

/// Box drawn for characters a font does not provide.
pub fn fallback() -> Glyph {
    outline_box(CELL_WIDTH, 1.0)
}

/// The built-in shape for a printable ASCII character.
pub(crate) fn glyph_for(character: char) -> Glyph {
    match character {
        ' ' => Glyph::blank(),
        'A' => Glyph::new(vec![
            stroke(&[(0.0, 0.0), (CELL_WIDTH / 2.0, 1.0), (CELL_WIDTH, 0.0)]),
            stroke(&[(CELL_WIDTH / 4.0, 0.5), (CELL_WIDTH * 0.75, 0.5)]),
        ]),
        c if c.is_ascii_alphanumeric() => fallback(),
        _ => outline_box(0.5, 0.5),
    }
}
