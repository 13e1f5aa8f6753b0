use serde::Serialize;

use crate::device::DeviceError;

/// Aggregate counters for one plot job.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PlotStatistics {
    /// Paths actually drawn.
    pub paths: usize,
    /// Paths skipped for having too few usable points.
    pub skipped_paths: usize,
    /// Total pen-down drawing distance, in target units.
    pub total_distance: f64,
    /// Pen lifts plus pen drops.
    pub pen_movements: usize,
    /// Points rejected for lying outside the workspace.
    pub invalid_points: usize,
    /// Rough run time, at two seconds per drawn path.
    pub estimated_time_s: f64,
}

/// What happened to a single path.
#[derive(Debug)]
pub enum PathOutcome {
    Plotted { distance: f64, invalid_points: usize },
    SkippedInvalid { invalid_points: usize },
    Aborted(DeviceError),
}

impl PlotStatistics {
    /// Seconds budgeted for each drawn path.
    pub const SECONDS_PER_PATH: f64 = 2.0;

    /// Fold per-path outcomes into job totals.
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a PathOutcome>) -> Self {
        let mut stats = Self::default();

        for outcome in outcomes {
            match outcome {
                PathOutcome::Plotted {
                    distance,
                    invalid_points,
                } => {
                    stats.paths += 1;
                    stats.total_distance += *distance;
                    stats.pen_movements += 2;
                    stats.invalid_points += *invalid_points;
                }
                PathOutcome::SkippedInvalid { invalid_points } => {
                    stats.skipped_paths += 1;
                    stats.invalid_points += *invalid_points;
                }
                PathOutcome::Aborted(_) => {}
            }
        }

        stats.estimated_time_s = stats.paths as f64 * Self::SECONDS_PER_PATH;
        stats
    }
}

/// Structured answer from every executor operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub statistics: PlotStatistics,
    /// Step-by-step narration of a simulated run.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub log: Vec<String>,
}

impl PlotResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            statistics: PlotStatistics::default(),
            log: Vec::new(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            statistics: PlotStatistics::default(),
            log: Vec::new(),
        }
    }

    pub fn with_statistics(mut self, statistics: PlotStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn with_log(mut self, log: Vec<String>) -> Self {
        self.log = log;
        self
    }
}
