//! Writes one preview SVG per mistake frequency. Pass a font path to use it
//! instead of the built-in glyphs.

use penscript::{GlyphStore, PreviewPage, TargetSpace, TextLayout};

const SAMPLE: &str = "the quick brown fox jumps over the lazy dog\nand then naps in the warm afternoon sun";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let glyphs = match std::env::args().nth(1) {
        Some(path) => GlyphStore::load(path)?,
        None => GlyphStore::builtin(),
    };

    let page = PreviewPage::default();
    let engine = TextLayout::new(&glyphs);

    for (name, frequency) in [("clean", 0.0), ("sloppy", 0.3), ("hopeless", 1.0)] {
        let layout = engine.layout(SAMPLE, 16.0, frequency, &TargetSpace::Preview(page));

        let file = format!("output_{name}.svg");
        penscript::svg::save(&file, &layout, &page)?;
        println!(
            "Wrote {file}: {} paths, {} crossed out",
            layout.path_count(),
            layout.strike_throughs.len()
        );
    }

    Ok(())
}
