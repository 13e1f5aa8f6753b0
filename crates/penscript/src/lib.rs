//! `penscript` turns text into pen strokes that look handwritten, and plots
//! them.
//!
//! The pieces live in their own crates and are re-exported here:
//! - glyph loading from single-line outline fonts, via [penscript_outline]
//! - word wrapping, shrink-to-fit and deliberate spelling mistakes, via
//!   [penscript_layout]
//! - plotter control and simulation, via [penscript_plot]
//!
//! ```
//! use penscript::{GlyphStore, TargetSpace, render_text};
//!
//! let glyphs = GlyphStore::builtin();
//! let paths = render_text(&glyphs, "Hello World!", 12.0, &TargetSpace::preview());
//! assert!(!paths.is_empty());
//! ```

pub mod config;
pub mod svg;

pub use config::{Config, ConfigError};
pub use penscript_core::{Glyph, GlyphSource, Point, PlotPath, Stroke, WorkspaceBounds};
pub use penscript_layout::{Layout, MistakeInjector, PreviewPage, TargetSpace, TextLayout};
pub use penscript_outline::{GlyphStore, LoadError};
pub use penscript_plot::{
    Device, DeviceError, MotionConfig, PlotExecutor, PlotResult, PlotState, PlotStatistics,
};

#[cfg(feature = "serial")]
pub use penscript_plot::ebb::EbbDevice;

/// Lay out `text` without mistakes and return every path to draw.
pub fn render_text<G: GlyphSource + ?Sized>(
    glyphs: &G,
    text: &str,
    font_size: f32,
    target: &TargetSpace,
) -> Vec<PlotPath> {
    TextLayout::new(glyphs)
        .layout(text, font_size, 0.0, target)
        .into_paths()
}
