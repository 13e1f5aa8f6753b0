//! Command-line front end.
//!
//! - preview: lay text out on the preview page, optionally writing an SVG
//! - plot: lay text out in plotter space and plot it, simulated unless
//!   `--hardware` is given
//! - glyph: dump the strokes for one character

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use log::{info, warn};
use serde::Serialize;

use penscript::config::{Config, PlotterMode};
use penscript::{
    GlyphSource, GlyphStore, Layout, PlotExecutor, PlotPath, PlotResult, TargetSpace, TextLayout,
};

#[derive(Parser)]
#[command(name = "penscript", version)]
#[command(about = "Render text as pen strokes and plot it", long_about = None)]
struct Cli {
    /// Configuration file (defaults to penscript.toml when present)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// More logging; repeat for more detail
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TextArgs {
    /// Text to render, or `-` to read standard input
    #[arg(short, long)]
    text: String,

    /// Em size in points
    #[arg(long)]
    font_size: Option<f32>,

    /// Chance, from 0 to 1, that an eligible word is misspelled and crossed out
    #[arg(long, value_name = "FREQUENCY")]
    mistakes: Option<f64>,

    /// Single-line font file
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Lay text out on the preview page
    Preview {
        #[command(flatten)]
        text: TextArgs,

        /// Write the preview as SVG
        #[arg(long, value_name = "FILE")]
        svg: Option<PathBuf>,

        /// Print the laid-out paths as JSON
        #[arg(long)]
        json: bool,
    },

    /// Plot text, simulated unless `--hardware` is given
    Plot {
        #[command(flatten)]
        text: TextArgs,

        /// Drive a real plotter
        #[arg(long)]
        hardware: bool,

        /// Serial port of the plotter; auto-detected otherwise
        #[arg(long)]
        port: Option<String>,

        /// Print the plot result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the strokes for one character
    Glyph {
        character: char,

        /// Single-line font file
        #[arg(long, value_name = "FILE")]
        font: Option<PathBuf>,
    },
}

const DEFAULT_CONFIG: &str = "penscript.toml";

#[derive(Serialize)]
struct PreviewReport<'a> {
    text: &'a str,
    scale: f32,
    lines: usize,
    paths: Vec<&'a PlotPath>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::init_from_env(env_logger::Env::default().filter_or(
        env_logger::DEFAULT_FILTER_ENV,
        match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        },
    ));

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Preview { text, svg, json } => {
            let page = penscript::PreviewPage::default();
            let layout = lay_out(&config, &text, &TargetSpace::Preview(page))?;

            if let Some(path) = &svg {
                penscript::svg::save(path, &layout, &page)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!("Wrote {}", path.display());
            }

            if json {
                let report = PreviewReport {
                    text: &layout.text,
                    scale: layout.scale,
                    lines: layout.lines,
                    paths: layout.paths().collect(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                summarize(&layout);
            }
        }
        Commands::Plot {
            text,
            hardware,
            port,
            json,
        } => {
            let bounds = config.workspace.bounds();
            let target = TargetSpace::Physical {
                bounds,
                margin: config.workspace.margin,
            };
            let layout = lay_out(&config, &text, &target)?;
            if !json {
                summarize(&layout);
            }

            let hardware = hardware || config.plotter.mode == PlotterMode::Hardware;
            let port = port.or_else(|| config.plotter.port.clone());
            let mut executor = executor(&config, hardware, port)?;
            info!("Plotting in {:?} mode", executor.mode());

            let results = [
                executor.connect(),
                executor.plot(&layout.into_paths()),
                executor.disconnect(),
            ];
            let plotted = results.iter().all(|result| result.success);

            if json {
                println!("{}", serde_json::to_string_pretty(&results[1])?);
            } else {
                for result in &results {
                    report(result);
                }
            }

            if !plotted {
                bail!("plotting failed");
            }
        }
        Commands::Glyph { character, font } => {
            let glyphs = load_glyphs(&config, font.as_deref())?;
            let glyph = glyphs.glyph(character);
            if !glyphs.contains(character) {
                warn!("{character:?} is not in the font; showing the fallback shape");
            }
            println!("{}", serde_json::to_string_pretty(glyph)?);
        }
    }

    Ok(())
}

/// Use `--config` when given, else `penscript.toml` if it exists, else
/// defaults.
fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG).exists() => Path::new(DEFAULT_CONFIG),
        None => return Ok(Config::default()),
    };

    let config = Config::from_file(path)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

fn load_glyphs(config: &Config, font: Option<&Path>) -> Result<GlyphStore> {
    match font.or(config.font.path.as_deref()) {
        Some(path) => GlyphStore::load_or_builtin(path, config.font.allow_fallback)
            .with_context(|| format!("failed to load font {}", path.display())),
        None => {
            info!("No font configured; using built-in glyphs");
            Ok(GlyphStore::builtin())
        }
    }
}

fn read_text(text: &str) -> Result<String> {
    if text != "-" {
        return Ok(text.to_owned());
    }

    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read text from stdin")?;
    Ok(buffer)
}

fn lay_out(config: &Config, args: &TextArgs, target: &TargetSpace) -> Result<Layout> {
    let glyphs = load_glyphs(config, args.font.as_deref())?;
    let text = read_text(&args.text)?;

    let font_size = args.font_size.unwrap_or(config.layout.font_size);
    let mistakes = args.mistakes.unwrap_or(config.layout.mistake_frequency);

    Ok(TextLayout::new(&glyphs).layout(&text, font_size, mistakes, target))
}

#[cfg(feature = "serial")]
fn executor(config: &Config, hardware: bool, port: Option<String>) -> Result<PlotExecutor> {
    let bounds = config.workspace.bounds();
    if !hardware {
        return Ok(PlotExecutor::simulated(bounds));
    }

    let device = penscript::EbbDevice::new(port);
    Ok(PlotExecutor::hardware(device, bounds, config.motion))
}

#[cfg(not(feature = "serial"))]
fn executor(config: &Config, hardware: bool, _port: Option<String>) -> Result<PlotExecutor> {
    if hardware {
        bail!("hardware plotting needs the `serial` feature");
    }
    Ok(PlotExecutor::simulated(config.workspace.bounds()))
}

fn summarize(layout: &Layout) {
    println!(
        "{} paths on {} lines at scale {:.2}",
        layout.path_count(),
        layout.lines,
        layout.scale
    );
    if let Some(bounds) = layout.bounds() {
        println!(
            "bounds: ({:.1}, {:.1}) to ({:.1}, {:.1})",
            bounds.min.x, bounds.min.y, bounds.max.x, bounds.max.y
        );
    }
    if !layout.strike_throughs.is_empty() {
        println!("text as written: {}", layout.text);
    }
}

fn report(result: &PlotResult) {
    for line in &result.log {
        println!("{line}");
    }
    match (&result.message, &result.error) {
        (_, Some(error)) => eprintln!("error: {error}"),
        (Some(message), None) => println!("{message}"),
        (None, None) => {}
    }
}
