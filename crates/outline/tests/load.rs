use penscript_core::GlyphSource;
use penscript_outline::{GlyphStore, LoadError};

const MISSING: &str = "this/font/does/not/exist.ttf";

#[test]
fn missing_file_is_io_error() {
    let err = GlyphStore::load(MISSING).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }), "{err:?}");
    assert!(err.to_string().contains("exist.ttf"));
}

#[test]
fn garbage_is_parse_error() {
    let err = GlyphStore::from_bytes(b"definitely not a font").unwrap_err();
    assert!(matches!(err, LoadError::Parse(_)), "{err:?}");
}

#[test]
fn fallback_substitutes_builtin_glyphs() {
    let store = GlyphStore::load_or_builtin(MISSING, true).expect("fallback accepted");
    assert_eq!(store.units_per_em(), 1);
    assert!(store.strokes_for(' ').is_empty());
    assert!(!store.strokes_for('x').is_empty());
}

#[test]
fn fallback_can_be_refused() {
    let err = GlyphStore::load_or_builtin(MISSING, false).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}

/// `A` is a closed triangle, `l` a closed bar, `x` reaches 3 em high and
/// space has no outline. Designed at 1000 units per em.
const STROKES_TTF: &[u8] = include_bytes!("fonts/strokes.ttf");

/// Maps only space, to an empty glyph.
const BLANK_TTF: &[u8] = include_bytes!("fonts/blank.ttf");

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

#[test]
fn real_font_loads_from_disk() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fonts/strokes.ttf");
    let store = GlyphStore::load(path).unwrap();
    assert_eq!(store.units_per_em(), 1000);
}

#[test]
fn outlines_are_normalised_to_the_em() {
    let store = GlyphStore::from_bytes(STROKES_TTF).unwrap();
    assert_eq!(store.units_per_em(), 1000);
    // Space, `A` and `l`.
    assert_eq!(store.len(), 3);

    let strokes = store.strokes_for('A');
    assert_eq!(strokes.len(), 1);
    let points = strokes[0].points();
    assert_eq!(points.len(), 4);
    assert_eq!(points.first(), points.last());
    assert!(points.iter().any(|p| close(p.x, 0.5) && close(p.y, 1.0)));
    assert!(points.iter().any(|p| close(p.x, 1.0) && close(p.y, 0.0)));

    let bar = store.strokes_for('l');
    assert_eq!(bar.len(), 1);
    assert_eq!(bar[0].len(), 5);
    for point in bar[0].points() {
        assert!((0.0..=1.0).contains(&point.x) && (0.0..=1.0).contains(&point.y));
    }
}

#[test]
fn font_space_is_blank() {
    let store = GlyphStore::from_bytes(STROKES_TTF).unwrap();
    assert!(store.contains(' '));
    assert!(store.strokes_for(' ').is_empty());
}

#[test]
fn characters_missing_from_font_draw_the_box() {
    let store = GlyphStore::from_bytes(STROKES_TTF).unwrap();
    for character in ['B', 'q', '7', '~'] {
        assert!(!store.contains(character));
        assert_eq!(store.glyph(character), store.fallback());
    }
}

#[test]
fn out_of_range_outline_draws_the_box() {
    let store = GlyphStore::from_bytes(STROKES_TTF).unwrap();
    assert!(!store.contains('x'));
    assert_eq!(store.glyph('x'), store.fallback());
    assert!(!store.strokes_for('x').is_empty());
}

#[test]
fn font_without_outlines_is_rejected() {
    let err = GlyphStore::from_bytes(BLANK_TTF).unwrap_err();
    assert!(matches!(err, LoadError::NoOutlines), "{err:?}");
}
