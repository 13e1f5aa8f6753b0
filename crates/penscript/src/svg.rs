//! SVG export for previewing a [Layout] before it goes to the plotter.

use std::path::Path;

use penscript_core::PlotPath;
use penscript_layout::{Layout, PreviewPage};
use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Path as SvgPath, Rectangle};

fn path_data(path: &PlotPath) -> Data {
    let mut points = path.points().iter();
    let mut data = Data::new();

    if let Some(first) = points.next() {
        data = data.move_to((first.x, first.y));
    }
    for p in points {
        data = data.line_to((p.x, p.y));
    }

    data
}

fn stroke(path: &PlotPath, colour: &str) -> SvgPath {
    SvgPath::new()
        .set("fill", "none")
        .set("stroke", colour)
        .set("stroke-width", 1)
        .set("stroke-linecap", "round")
        .set("stroke-linejoin", "round")
        .set("d", path_data(path))
}

/// Render a preview-space layout onto a page-sized SVG.
///
/// Strike-throughs are drawn in red so mistakes stand out.
pub fn document(layout: &Layout, page: &PreviewPage) -> Document {
    let (width, height) = (page.width, page.height);

    let background = Rectangle::new()
        .set("x", 0)
        .set("y", 0)
        .set("width", width)
        .set("height", height)
        .set("fill", "white");

    let mut document = Document::new().add(background);

    for path in layout.glyphs.iter().flat_map(|glyph| glyph.paths.iter()) {
        document = document.add(stroke(path, "black"));
    }
    for path in &layout.strike_throughs {
        document = document.add(stroke(path, "red"));
    }

    document
        .set("viewBox", (0, 0, width, height))
        .set("width", format!("{width}px"))
        .set("height", format!("{height}px"))
}

pub fn save(path: impl AsRef<Path>, layout: &Layout, page: &PreviewPage) -> std::io::Result<()> {
    svg::save(path, &document(layout, page))
}
