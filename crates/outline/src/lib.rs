//! `penscript-outline` turns an outline font (TrueType or OpenType) into
//! single-line glyph strokes that a pen plotter can trace.
//!
//! Fonts are parsed once with [ttf_parser]. Every printable ASCII character is
//! flattened into polylines normalized to the em-square and kept in a fixed
//! table; characters the font lacks draw a box instead.
//!
//! ```no_run
//! use penscript_core::GlyphSource;
//! use penscript_outline::GlyphStore;
//!
//! let store = GlyphStore::load_or_builtin("fonts/SingleLine.ttf", true).unwrap();
//! let strokes = store.strokes_for('a');
//! ```

mod builtin;
pub mod contour;

use std::{io, path::Path, path::PathBuf};

use log::{debug, info, warn};
use penscript_core::{Glyph, GlyphSource};

pub use builtin::{CELL_WIDTH, fallback};
pub use contour::ContourCollector;

/// First character stored in the glyph table.
pub const FIRST_CHAR: char = ' ';
/// Last character stored in the glyph table.
pub const LAST_CHAR: char = '~';
const NUM_GLYPHS: usize = LAST_CHAR as usize - FIRST_CHAR as usize + 1;

type GlyphTable = [Option<Glyph>; NUM_GLYPHS];

/// Errors produced while loading a font.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read font file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse font face: {0}")]
    Parse(#[from] ttf_parser::FaceParsingError),

    #[error("font declares an invalid units-per-em value of {0}")]
    InvalidUnitsPerEm(u16),

    #[error("font has no outline data for any printable ASCII character")]
    NoOutlines,
}

/// Per-character stroke polylines, built once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct GlyphStore {
    glyphs: GlyphTable,
    fallback: Glyph,
    units_per_em: u16,
}

fn table_index(character: char) -> Option<usize> {
    (FIRST_CHAR..=LAST_CHAR)
        .contains(&character)
        .then(|| character as usize - FIRST_CHAR as usize)
}

fn table_char(index: usize) -> char {
    char::from(FIRST_CHAR as u8 + index as u8)
}

impl GlyphStore {
    /// Load a font file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_owned(),
            source,
        })?;

        let store = Self::from_bytes(&data)?;
        info!(
            "Loaded {} glyphs from {} ({} units per em)",
            store.len(),
            path.display(),
            store.units_per_em
        );
        Ok(store)
    }

    /// Load a font, substituting [GlyphStore::builtin] on failure when
    /// `allow_fallback` is set.
    pub fn load_or_builtin(
        path: impl AsRef<Path>,
        allow_fallback: bool,
    ) -> Result<Self, LoadError> {
        match Self::load(path) {
            Ok(store) => Ok(store),
            Err(err) if allow_fallback => {
                warn!("{err}; using built-in development glyphs");
                Ok(Self::builtin())
            }
            Err(err) => Err(err),
        }
    }

    /// Parse the first face of an in-memory font file.
    pub fn from_bytes(data: &[u8]) -> Result<Self, LoadError> {
        let face = ttf_parser::Face::parse(data, 0)?;

        let units_per_em = face.units_per_em();
        if units_per_em == 0 {
            return Err(LoadError::InvalidUnitsPerEm(units_per_em));
        }

        let mut glyphs: GlyphTable = [const { None }; NUM_GLYPHS];
        let mut outlined = 0;
        let mut discarded = 0;

        for (index, slot) in glyphs.iter_mut().enumerate() {
            let character = table_char(index);

            let Some(glyph_id) = face.glyph_index(character) else {
                continue;
            };

            let mut collector = ContourCollector::new(units_per_em as f32);
            if face.outline_glyph(glyph_id, &mut collector).is_none() {
                if character == ' ' {
                    *slot = Some(Glyph::blank());
                }
                continue;
            }

            discarded += collector.discarded();
            let strokes = collector.finish();
            if strokes.is_empty() {
                // Left empty so the character draws the fallback box.
                debug!("{character:?} has no usable strokes");
                continue;
            }

            outlined += 1;
            *slot = Some(Glyph::new(strokes));
        }

        if outlined == 0 {
            return Err(LoadError::NoOutlines);
        }

        if discarded > 0 {
            debug!("Discarded {discarded} out-of-range sub-paths while loading font");
        }

        // Space is always drawable, even if the font omits it.
        glyphs[0].get_or_insert_with(Glyph::blank);

        Ok(Self {
            glyphs,
            fallback: fallback(),
            units_per_em,
        })
    }

    /// Minimal development glyph set: boxes for letters, digits and symbols.
    pub fn builtin() -> Self {
        let mut glyphs: GlyphTable = [const { None }; NUM_GLYPHS];

        for (index, slot) in glyphs.iter_mut().enumerate() {
            *slot = Some(builtin::glyph_for(table_char(index)));
        }

        Self {
            glyphs,
            fallback: fallback(),
            units_per_em: 1,
        }
    }

    /// Units per em declared by the source font (1 for the built-in set).
    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    /// Number of characters with a glyph of their own.
    pub fn len(&self) -> usize {
        self.glyphs.iter().filter(|glyph| glyph.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The glyph drawn for characters without one of their own.
    pub fn fallback(&self) -> &Glyph {
        &self.fallback
    }

    /// Does `character` have its own glyph (as opposed to the fallback)?
    pub fn contains(&self, character: char) -> bool {
        table_index(character).is_some_and(|index| self.glyphs[index].is_some())
    }
}

impl GlyphSource for GlyphStore {
    fn glyph(&self, character: char) -> &Glyph {
        table_index(character)
            .and_then(|index| self.glyphs[index].as_ref())
            .unwrap_or(&self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_printable_ascii() {
        let store = GlyphStore::builtin();
        assert_eq!(store.len(), NUM_GLYPHS);

        for character in FIRST_CHAR..=LAST_CHAR {
            assert!(store.contains(character), "{character:?} missing");
        }
    }

    #[test]
    fn space_is_blank() {
        let store = GlyphStore::builtin();
        assert!(store.glyph(' ').is_blank());
        assert!(store.strokes_for(' ').is_empty());
    }

    #[test]
    fn unknown_characters_use_fallback() {
        let store = GlyphStore::builtin();
        for character in ['\t', '\u{7f}', 'é', '字'] {
            assert_eq!(store.glyph(character), store.fallback());
            assert!(!store.strokes_for(character).is_empty());
        }
    }

    #[test]
    fn builtin_strokes_stay_in_em_square() {
        let store = GlyphStore::builtin();
        for character in FIRST_CHAR..=LAST_CHAR {
            for stroke in store.strokes_for(character) {
                assert!(stroke.len() >= 2);
                for point in stroke.points() {
                    assert!((0.0..=1.0).contains(&point.x));
                    assert!((0.0..=1.0).contains(&point.y));
                }
            }
        }
    }

    #[test]
    fn letter_a_has_crossbar() {
        let store = GlyphStore::builtin();
        assert_eq!(store.strokes_for('A').len(), 2);
        assert_eq!(store.strokes_for('B').len(), 1);
    }
}
