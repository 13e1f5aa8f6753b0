//! `penscript-layout` word-wraps text into positioned [PlotPath]s.
//!
//! Layout pulls glyph strokes from any [GlyphSource], optionally misspells
//! words through a [MistakeInjector] (crossing them out afterwards), and maps
//! everything into a [TargetSpace]: an on-screen preview or a plotter
//! workspace.
//!
//! Font sizes are given in points. One em is `font_size` points, converted to
//! target units by [TargetSpace::units_per_point]. Every character cell
//! advances [CHAR_WIDTH] × [CHAR_SPACING] em, words are separated by one
//! advance and lines by [LINE_SPACING] em.

pub mod mistake;
pub mod transform;

use log::{debug, warn};
use penscript_core::{GlyphSource, Point, PlotPath};
use rand::Rng;

pub use mistake::MistakeInjector;
pub use transform::{Cursor, Frame, PreviewPage, TargetSpace, to_physical, to_preview};

/// Width of a character cell, in em units.
pub const CHAR_WIDTH: f32 = 0.75;
/// Horizontal advance as a multiple of [CHAR_WIDTH].
pub const CHAR_SPACING: f32 = 1.2;
/// Line pitch, in em units.
pub const LINE_SPACING: f32 = 1.5;
/// Height of strike-through lines above the baseline, in em units.
pub const STRIKE_HEIGHT: f32 = 0.35;

/// A word and whether it was misspelled on purpose.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub is_mistake: bool,
    /// Byte offset of the word in the source text.
    offset: usize,
}

impl Word {
    /// Length in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// One explicit line of the input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Line {
    pub words: Vec<Word>,
}

/// Text broken into lines and words, after mistakes are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    source: String,
    pub lines: Vec<Line>,
}

fn split_words(line: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start = None;

    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                words.push((s, &line[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }

    if let Some(s) = start {
        words.push((s, &line[s..]));
    }

    words
}

impl Document {
    /// Split `text` on line breaks and whitespace, passing each word through
    /// the mistake injector.
    pub fn parse<R: Rng + ?Sized>(text: &str, mistakes: &MistakeInjector, rng: &mut R) -> Self {
        let mut lines = Vec::new();
        let mut line_start = 0;

        for line in text.split('\n') {
            let words = split_words(line)
                .into_iter()
                .map(|(offset, word)| {
                    let (text, is_mistake) = mistakes.maybe_corrupt(word, rng);
                    Word {
                        text,
                        is_mistake,
                        offset: line_start + offset,
                    }
                })
                .collect();

            lines.push(Line { words });
            line_start += line.len() + 1;
        }

        Self {
            source: text.to_owned(),
            lines,
        }
    }

    /// The text as it will be drawn: the source with misspelled words
    /// substituted in place.
    pub fn text(&self) -> String {
        let mut text = self.source.clone();
        for word in self.words().filter(|word| word.is_mistake) {
            // Mistakes only touch ASCII words and keep their length.
            text.replace_range(word.offset..word.offset + word.text.len(), &word.text);
        }
        text
    }

    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.lines.iter().flat_map(|line| line.words.iter())
    }

    /// Characters in the longest word.
    pub fn longest_word(&self) -> usize {
        self.words().map(Word::len).max().unwrap_or(0)
    }

    /// Characters needed to draw each line on its own, spaces included.
    pub fn char_count(&self) -> usize {
        self.lines
            .iter()
            .map(|line| {
                let letters: usize = line.words.iter().map(Word::len).sum();
                letters + line.words.len().saturating_sub(1)
            })
            .sum()
    }
}

/// The paths drawn for one character.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedGlyph {
    pub character: char,
    pub paths: Vec<PlotPath>,
}

/// Axis-aligned bounding rectangle of a layout.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TextBounds {
    pub min: Point,
    pub max: Point,
}

impl TextBounds {
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

/// Result of laying out one piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// One entry per drawn character, in reading order.
    pub glyphs: Vec<PlacedGlyph>,
    /// Lines crossing out misspelled words.
    pub strike_throughs: Vec<PlotPath>,
    /// The text as drawn, mistakes included.
    pub text: String,
    /// Shrink-to-fit factor that was applied, in `(0, 1]`.
    pub scale: f32,
    /// Number of lines after wrapping.
    pub lines: usize,
}

impl Layout {
    fn empty(text: String) -> Self {
        Self {
            glyphs: Vec::new(),
            strike_throughs: Vec::new(),
            text,
            scale: 1.0,
            lines: 0,
        }
    }

    /// All paths: glyph strokes in reading order, then strike-throughs.
    pub fn paths(&self) -> impl Iterator<Item = &PlotPath> {
        self.glyphs
            .iter()
            .flat_map(|glyph| glyph.paths.iter())
            .chain(self.strike_throughs.iter())
    }

    pub fn into_paths(self) -> Vec<PlotPath> {
        self.glyphs
            .into_iter()
            .flat_map(|glyph| glyph.paths)
            .chain(self.strike_throughs)
            .collect()
    }

    pub fn path_count(&self) -> usize {
        self.paths().count()
    }

    /// Bounding rectangle of every path, if anything was drawn.
    pub fn bounds(&self) -> Option<TextBounds> {
        let mut points = self.paths().flat_map(|path| path.points().iter());
        let first = *points.next()?;

        Some(points.fold(
            TextBounds {
                min: first,
                max: first,
            },
            |bounds, p| TextBounds {
                min: Point::new(bounds.min.x.min(p.x), bounds.min.y.min(p.y)),
                max: Point::new(bounds.max.x.max(p.x), bounds.max.y.max(p.y)),
            },
        ))
    }
}

/// Pick the single scale factor for a layout pass.
///
/// The longest word must fit on one line, the explicit lines must fit the
/// frame height, and the estimated width of all text must fit the frame's
/// width budget (its width times the number of lines it can hold).
fn fit_scale(document: &Document, em: f32, frame: &Frame) -> f32 {
    let advance = CHAR_WIDTH * CHAR_SPACING * em;
    let line_pitch = LINE_SPACING * em;
    let mut scale: f32 = 1.0;

    let longest = document.longest_word() as f32 * advance;
    if longest > 0.0 {
        scale = scale.min(frame.width / longest);
    }

    let lines = document.lines.len() as f32 * line_pitch;
    if lines > 0.0 {
        scale = scale.min(frame.height / lines);
    }

    let total = document.char_count() as f32 * advance;
    if total > 0.0 {
        scale = scale.min((frame.width * frame.height / (total * line_pitch)).sqrt());
    }

    scale.clamp(f32::MIN_POSITIVE, 1.0)
}

struct Placer<'a, G: GlyphSource + ?Sized> {
    glyphs: &'a G,
    target: &'a TargetSpace,
    frame: Frame,
    em: f32,
    advance: f32,
    line_pitch: f32,
    cursor_y: f32,
    lines: usize,
    placed: Vec<PlacedGlyph>,
    strikes: Vec<(f32, f32, f32)>,
}

impl<G: GlyphSource + ?Sized> Placer<'_, G> {
    fn place_char(&mut self, character: char, cursor: Cursor) {
        let paths: Vec<PlotPath> = self
            .glyphs
            .strokes_for(character)
            .iter()
            .filter_map(|stroke| {
                let points = stroke
                    .points()
                    .iter()
                    .map(|&norm| self.target.place(norm, cursor, self.em))
                    .collect();

                PlotPath::new(points)
                    .inspect_err(|err| debug!("Skipping stroke of {character:?}: {err}"))
                    .ok()
            })
            .collect();

        if !paths.is_empty() {
            self.placed.push(PlacedGlyph { character, paths });
        }
    }

    /// Draw one packed line and move the cursor down.
    fn flush(&mut self, words: &[&Word]) {
        let mut x = self.frame.origin.x;

        for (i, word) in words.iter().enumerate() {
            if i > 0 {
                x += self.advance;
            }

            let start = x;
            for character in word.text.chars() {
                if !character.is_whitespace() {
                    self.place_char(character, Cursor::new(x, self.cursor_y));
                }
                x += self.advance;
            }

            if word.is_mistake {
                let end = x - self.advance + CHAR_WIDTH * self.em;
                self.strikes.push((start, end, self.cursor_y));
            }
        }

        self.cursor_y += self.line_pitch;
        self.lines += 1;
    }

    fn finish(self) -> (Vec<PlacedGlyph>, Vec<PlotPath>, usize) {
        let strike = Point::new(0.0, STRIKE_HEIGHT);
        let strike_throughs = self
            .strikes
            .iter()
            .map(|&(start, end, y)| {
                PlotPath::segment(
                    self.target.place(strike, Cursor::new(start, y), self.em),
                    self.target.place(strike, Cursor::new(end, y), self.em),
                )
            })
            .collect();

        (self.placed, strike_throughs, self.lines)
    }
}

/// Lays text out using a shared glyph table.
#[derive(Debug)]
pub struct TextLayout<'a, G: GlyphSource + ?Sized> {
    glyphs: &'a G,
}

impl<'a, G: GlyphSource + ?Sized> TextLayout<'a, G> {
    pub fn new(glyphs: &'a G) -> Self {
        Self { glyphs }
    }

    /// Lay out `text` at `font_size` points into `target`, misspelling words
    /// with probability `mistake_frequency` using the thread-local RNG.
    pub fn layout(
        &self,
        text: &str,
        font_size: f32,
        mistake_frequency: f64,
        target: &TargetSpace,
    ) -> Layout {
        self.layout_with_rng(text, font_size, mistake_frequency, target, &mut rand::rng())
    }

    /// Like [TextLayout::layout], drawing mistakes from `rng`.
    pub fn layout_with_rng<R: Rng + ?Sized>(
        &self,
        text: &str,
        font_size: f32,
        mistake_frequency: f64,
        target: &TargetSpace,
        rng: &mut R,
    ) -> Layout {
        let mistakes = MistakeInjector::new(mistake_frequency);
        let document = Document::parse(text, &mistakes, rng);

        if !(font_size.is_finite() && font_size > 0.0) {
            warn!("Ignoring layout with invalid font size {font_size}");
            return Layout::empty(document.text());
        }

        let frame = target.frame();
        let base_em = font_size * target.units_per_point();
        let scale = fit_scale(&document, base_em, &frame);
        let em = base_em * scale;

        debug!(
            "Layout of {} lines at {font_size}pt, shrink factor {scale:.3}",
            document.lines.len()
        );

        let mut placer = Placer {
            glyphs: self.glyphs,
            target,
            frame,
            em,
            advance: CHAR_WIDTH * CHAR_SPACING * em,
            line_pitch: LINE_SPACING * em,
            cursor_y: frame.origin.y,
            lines: 0,
            placed: Vec::new(),
            strikes: Vec::new(),
        };

        for line in &document.lines {
            let mut current: Vec<&Word> = Vec::new();
            let mut width = 0.0;

            for word in &line.words {
                let word_width = word.len() as f32 * placer.advance;

                if current.is_empty() {
                    width = word_width;
                    current.push(word);
                    continue;
                }

                let extended = width + placer.advance + word_width;
                if extended > frame.width {
                    placer.flush(&current);
                    current.clear();
                    width = word_width;
                } else {
                    width = extended;
                }
                current.push(word);
            }

            placer.flush(&current);
        }

        let (glyphs, strike_throughs, lines) = placer.finish();

        Layout {
            glyphs,
            strike_throughs,
            text: document.text(),
            scale,
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn parse(text: &str) -> Document {
        Document::parse(text, &MistakeInjector::new(0.0), &mut StdRng::seed_from_u64(0))
    }

    #[test]
    fn words_keep_their_offsets() {
        assert_eq!(
            split_words("  two\twords "),
            vec![(2, "two"), (6, "words")]
        );
        assert!(split_words("   ").is_empty());
    }

    #[test]
    fn document_lines_follow_breaks() {
        let document = parse("one two\r\n\nthree");
        assert_eq!(document.lines.len(), 3);
        assert_eq!(document.lines[0].words.len(), 2);
        assert!(document.lines[1].words.is_empty());
        assert_eq!(document.lines[2].words[0].text, "three");
        assert_eq!(document.text(), "one two\r\n\nthree");
    }

    #[test]
    fn mistakes_substitute_in_place() {
        let mistakes = MistakeInjector::new(1.0);
        let mut rng = StdRng::seed_from_u64(9);
        let document = Document::parse("  the\ncat  ", &mistakes, &mut rng);

        let text = document.text();
        assert_eq!(text.len(), "  the\ncat  ".len());
        assert_ne!(text, "  the\ncat  ");
        assert!(text.starts_with("  th"));
        assert!(text.ends_with("t  "));
        assert_eq!(&text[5..7], "\nc");
    }

    #[test]
    fn char_count_includes_gaps() {
        let document = parse("ab cd\nefg");
        assert_eq!(document.char_count(), 5 + 3);
        assert_eq!(document.longest_word(), 3);
    }

    #[test]
    fn short_text_is_not_shrunk() {
        let document = parse("hi");
        let frame = TargetSpace::preview().frame();
        assert_eq!(fit_scale(&document, 16.0, &frame), 1.0);
    }

    #[test]
    fn long_word_is_shrunk_to_width() {
        let document = parse(&"w".repeat(100));
        let frame = TargetSpace::preview().frame();
        let em = 20.0;
        let scale = fit_scale(&document, em, &frame);
        let width = 100.0 * CHAR_WIDTH * CHAR_SPACING * em * scale;
        assert!(scale < 1.0);
        assert!(width <= frame.width + 1e-3);
    }
}
