//! `penscript.toml` parsing.

use std::path::{Path, PathBuf};

use penscript_core::WorkspaceBounds;
use penscript_plot::MotionConfig;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for '{field}' in {path}: {reason}")]
    Invalid {
        path: PathBuf,
        field: &'static str,
        reason: String,
    },
}

/// A parsed configuration file. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub font: FontSection,
    pub layout: LayoutSection,
    pub plotter: PlotterSection,
    pub workspace: WorkspaceSection,
    pub motion: MotionConfig,
}

/// The `[font]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FontSection {
    /// Single-line font to load. Without one, the built-in glyphs are used.
    pub path: Option<PathBuf>,

    /// Use the built-in glyphs when the font cannot be loaded.
    pub allow_fallback: bool,
}

impl Default for FontSection {
    fn default() -> Self {
        Self {
            path: None,
            allow_fallback: true,
        }
    }
}

/// The `[layout]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutSection {
    /// Em size in points.
    pub font_size: f32,
    pub mistake_frequency: f64,
}

impl Default for LayoutSection {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            mistake_frequency: 0.0,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotterMode {
    #[default]
    Simulated,
    Hardware,
}

/// The `[plotter]` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlotterSection {
    pub mode: PlotterMode,
    /// Serial port; auto-detected when absent.
    pub port: Option<String>,
}

/// The `[workspace]` section, in millimetres.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorkspaceSection {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub margin: f32,
}

impl Default for WorkspaceSection {
    fn default() -> Self {
        let bounds = WorkspaceBounds::AXIDRAW_MINI;
        Self {
            min_x: bounds.min_x,
            max_x: bounds.max_x,
            min_y: bounds.min_y,
            max_y: bounds.max_y,
            margin: 10.0,
        }
    }
}

impl WorkspaceSection {
    pub fn bounds(&self) -> WorkspaceBounds {
        WorkspaceBounds {
            min_x: self.min_x,
            max_x: self.max_x,
            min_y: self.min_y,
            max_y: self.max_y,
        }
    }
}

impl Config {
    /// Load a config from a file path.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_owned(),
            source: e,
        })?;

        Self::from_str(&content, path)
    }

    /// Parse a config from a string. `path` is only used in error messages.
    pub fn from_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })?;

        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let invalid = |field, reason: String| ConfigError::Invalid {
            path: path.to_owned(),
            field,
            reason,
        };

        if !(self.layout.font_size.is_finite() && self.layout.font_size > 0.0) {
            return Err(invalid(
                "layout.font_size",
                format!("must be a positive number, got {}", self.layout.font_size),
            ));
        }

        let ws = &self.workspace;
        for (field, value) in [
            ("workspace.min_x", ws.min_x),
            ("workspace.max_x", ws.max_x),
            ("workspace.min_y", ws.min_y),
            ("workspace.max_y", ws.max_y),
            ("workspace.margin", ws.margin),
        ] {
            if !value.is_finite() {
                return Err(invalid(field, format!("must be a finite number, got {value}")));
            }
        }

        if ws.max_x <= ws.min_x || ws.max_y <= ws.min_y {
            return Err(invalid(
                "workspace",
                "maximum must be greater than minimum on both axes".into(),
            ));
        }
        if ws.margin < 0.0 || 2.0 * ws.margin >= (ws.max_x - ws.min_x).min(ws.max_y - ws.min_y) {
            return Err(invalid(
                "workspace.margin",
                format!("{} leaves no drawable area", ws.margin),
            ));
        }

        self.motion
            .validate()
            .map_err(|e| invalid("motion", e.to_string()))
    }
}
