//! `penscript-plot` sends [PlotPath]s to a pen plotter, or narrates what a
//! plotter would do.
//!
//! The [PlotExecutor] owns the connection and walks this state machine:
//!
//! ```text
//! Disconnected -> Connected -> (Homing <-> Plotting) -> Connected
//!                      \______________________________-> Error
//! ```
//!
//! Every operation answers with a [PlotResult]; device failures never escape
//! as panics or raw errors.

pub mod device;
#[cfg(feature = "serial")]
pub mod ebb;
pub mod motion;
pub mod result;

use log::{debug, error, info, warn};
use penscript_core::{Point, PlotPath, WorkspaceBounds};

pub use device::{ConnectFailure, Device, DeviceError};
pub use motion::{ConfigurationError, MotionConfig};
pub use result::{PathOutcome, PlotResult, PlotStatistics};

/// How plotting requests are carried out.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Dry run: no device I/O, a log of what would happen.
    Simulated,
    /// Commands go to a physical [Device].
    Hardware,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlotState {
    Disconnected,
    Connected,
    Homing,
    Plotting,
    /// A job failed and the pen could not be parked. Reconnect to recover.
    Error,
}

fn distance(a: Point, b: Point) -> f64 {
    (b.x as f64 - a.x as f64).hypot(b.y as f64 - a.y as f64)
}

fn path_length(points: &[Point]) -> f64 {
    points.windows(2).map(|pair| distance(pair[0], pair[1])).sum()
}

/// Lift the pen, travel to the origin and make sure the pen is still up.
fn home(device: &mut dyn Device) -> Result<(), DeviceError> {
    device.pen_up()?;
    device.move_to(0.0, 0.0)?;
    device.pen_up()
}

/// Park the pen after a failed job.
fn recover(device: &mut dyn Device) -> Result<(), DeviceError> {
    device.pen_up()?;
    home(device)
}

fn settle(device: &mut dyn Device, motion: &MotionConfig) -> Result<(), DeviceError> {
    if motion.settle_ms > 0 {
        device.delay(motion.settle_ms)?;
    }
    Ok(())
}

fn draw(device: &mut dyn Device, motion: &MotionConfig, points: &[Point]) -> Result<f64, DeviceError> {
    let Some((first, rest)) = points.split_first() else {
        return Ok(0.0);
    };

    device.move_to(first.x, first.y)?;
    device.pen_down()?;
    settle(device, motion)?;

    for point in rest {
        device.line_to(point.x, point.y)?;
    }

    device.pen_up()?;
    settle(device, motion)?;

    Ok(path_length(points))
}

/// Check one path against the workspace and draw what is safe to draw.
///
/// A path is skipped when its starting point is outside the workspace, or
/// when fewer than two points remain after dropping out-of-bounds ones.
fn plot_path(
    device: &mut dyn Device,
    bounds: &WorkspaceBounds,
    motion: &MotionConfig,
    index: usize,
    path: &PlotPath,
) -> PathOutcome {
    let inside: Vec<Point> = path
        .points()
        .iter()
        .copied()
        .filter(|&point| bounds.contains(point))
        .collect();
    let rejected = path.len() - inside.len();

    let start_outside = path.first().is_some_and(|point| !bounds.contains(point));

    if start_outside || inside.len() < 2 {
        warn!(
            "Path {index}: {rejected} of {} points outside the workspace, skipping",
            path.len()
        );
        return PathOutcome::SkippedInvalid {
            invalid_points: rejected.max(1),
        };
    }

    if rejected > 0 {
        warn!("Path {index}: dropped {rejected} points outside the workspace");
    }

    debug!("Path {index}: drawing {} points", inside.len());
    match draw(device, motion, &inside) {
        Ok(distance) => PathOutcome::Plotted {
            distance,
            invalid_points: rejected,
        },
        Err(err) => PathOutcome::Aborted(err),
    }
}

/// Narrate a plot without touching any hardware.
fn simulate(paths: &[PlotPath]) -> PlotResult {
    let mut log = vec![
        "=== Starting plot simulation ===".to_owned(),
        "Moving to home position (0, 0) with pen up".to_owned(),
    ];
    let mut outcomes = Vec::with_capacity(paths.len());

    for (index, path) in paths.iter().enumerate() {
        let points = path.points();

        if points.len() < 2 {
            warn!("Path {index} has {} point(s), skipping", points.len());
            log.push(format!(
                "Warning: path {index} has {} point(s), skipping",
                points.len()
            ));
            outcomes.push(PathOutcome::SkippedInvalid { invalid_points: 0 });
            continue;
        }

        let first = points[0];
        log.push(format!(
            "Path {}: move to ({:.1}, {:.1}), pen down",
            index + 1,
            first.x,
            first.y
        ));
        for point in &points[1..] {
            log.push(format!("  line to ({:.1}, {:.1})", point.x, point.y));
        }

        let distance = path_length(points);
        log.push(format!("  drew {distance:.1} units, pen up"));
        outcomes.push(PathOutcome::Plotted {
            distance,
            invalid_points: 0,
        });
    }

    let stats = PlotStatistics::from_outcomes(&outcomes);

    log.push("Returning to home position (0, 0) with pen up".to_owned());
    log.push("=== Plot statistics ===".to_owned());
    log.push(format!("Paths plotted: {}", stats.paths));
    log.push(format!("Paths skipped: {}", stats.skipped_paths));
    log.push(format!("Drawing distance: {:.1} units", stats.total_distance));
    log.push(format!("Pen movements: {}", stats.pen_movements));
    log.push(format!("Estimated time: {:.0} s", stats.estimated_time_s));

    info!(
        "Simulated {} paths, {:.1} units",
        stats.paths, stats.total_distance
    );

    PlotResult::ok("Simulated plot completed")
        .with_statistics(stats)
        .with_log(log)
}

/// Owns the plotter connection and runs plot jobs one at a time.
pub struct PlotExecutor {
    /// `None` in simulated mode.
    device: Option<Box<dyn Device + Send>>,
    state: PlotState,
    bounds: WorkspaceBounds,
    motion: MotionConfig,
}

impl PlotExecutor {
    /// An executor that only simulates.
    pub fn simulated(bounds: WorkspaceBounds) -> Self {
        Self {
            device: None,
            state: PlotState::Disconnected,
            bounds,
            motion: MotionConfig::default(),
        }
    }

    /// An executor driving `device`.
    pub fn hardware(
        device: impl Device + Send + 'static,
        bounds: WorkspaceBounds,
        motion: MotionConfig,
    ) -> Self {
        Self {
            device: Some(Box::new(device)),
            state: PlotState::Disconnected,
            bounds,
            motion,
        }
    }

    pub fn mode(&self) -> Mode {
        match self.device {
            Some(_) => Mode::Hardware,
            None => Mode::Simulated,
        }
    }

    pub fn state(&self) -> PlotState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == PlotState::Connected
    }

    pub fn bounds(&self) -> WorkspaceBounds {
        self.bounds
    }

    pub fn connect(&mut self) -> PlotResult {
        if self.state == PlotState::Connected {
            info!("Already connected");
            return PlotResult::ok("Already connected");
        }

        let Some(device) = self.device.as_deref_mut() else {
            info!("Connected in simulation mode");
            self.state = PlotState::Connected;
            return PlotResult::ok("Connected in simulation mode (no hardware)");
        };

        if self.state == PlotState::Error {
            info!("Resetting device after a failed job");
            if let Err(err) = device.disconnect() {
                debug!("Ignoring disconnect failure during reset: {err}");
            }
        }

        info!("Connecting to plotter");
        match device.connect().and_then(|()| device.pen_up()) {
            Ok(()) => {
                info!("Plotter connected and responsive");
                self.state = PlotState::Connected;
                PlotResult::ok("Connected to plotter")
            }
            Err(err) => {
                error!("Failed to connect to plotter: {err}");
                if let Err(cleanup) = device.disconnect() {
                    debug!("Cleanup after failed connection also failed: {cleanup}");
                }
                self.state = PlotState::Disconnected;
                PlotResult::failed(err.diagnostic())
            }
        }
    }

    pub fn disconnect(&mut self) -> PlotResult {
        if self.state == PlotState::Disconnected {
            return PlotResult::ok("Already disconnected");
        }

        self.state = PlotState::Disconnected;

        let Some(device) = self.device.as_deref_mut() else {
            info!("Disconnected simulation");
            return PlotResult::ok("Disconnected (simulation mode)");
        };

        match device.disconnect() {
            Ok(()) => {
                info!("Disconnected from plotter");
                PlotResult::ok("Disconnected from plotter")
            }
            Err(err) => {
                error!("Error while disconnecting: {err}");
                PlotResult::failed(format!("Failed to disconnect cleanly: {err}"))
            }
        }
    }

    /// Draw `paths` in order.
    pub fn plot(&mut self, paths: &[PlotPath]) -> PlotResult {
        match self.state {
            PlotState::Connected => {}
            PlotState::Error => {
                return PlotResult::failed(
                    "Plotter is in an error state; reconnect before plotting",
                );
            }
            _ => return PlotResult::failed("Plotter not connected"),
        }

        match self.device.as_deref_mut() {
            None => simulate(paths),
            Some(device) => {
                let bounds = self.bounds;
                let motion = self.motion;
                run_hardware(device, &bounds, &motion, paths, &mut self.state)
            }
        }
    }
}

/// Drive the device through a whole job, recovering on failure.
fn run_hardware(
    device: &mut dyn Device,
    bounds: &WorkspaceBounds,
    motion: &MotionConfig,
    paths: &[PlotPath],
    state: &mut PlotState,
) -> PlotResult {
    if let Err(err) = motion.validate() {
        error!("Refusing to plot: {err}");
        return PlotResult::failed(format!("Invalid motion configuration: {err}"));
    }

    info!("Plotting {} paths", paths.len());

    let prepare = device.configure_motion(motion).and_then(|()| {
        *state = PlotState::Homing;
        home(device)
    });
    if let Err(err) = prepare {
        return abort(device, state, err, PlotStatistics::default());
    }

    *state = PlotState::Plotting;
    let mut outcomes = Vec::with_capacity(paths.len());
    for (index, path) in paths.iter().enumerate() {
        let outcome = plot_path(device, bounds, motion, index, path);
        let aborted = matches!(outcome, PathOutcome::Aborted(_));
        outcomes.push(outcome);
        if aborted {
            break;
        }
    }

    let stats = PlotStatistics::from_outcomes(&outcomes);

    if let Some(PathOutcome::Aborted(err)) = outcomes.pop() {
        return abort(device, state, err, stats);
    }

    *state = PlotState::Homing;
    if let Err(err) = home(device) {
        return abort(device, state, err, stats);
    }

    *state = PlotState::Connected;
    info!(
        "Plot complete: {} drawn, {} skipped, {} invalid points",
        stats.paths, stats.skipped_paths, stats.invalid_points
    );
    PlotResult::ok("Plotting completed successfully").with_statistics(stats)
}

/// Report `err` after trying to park the pen. A recovery failure is logged
/// but the original error is what the caller sees.
fn abort(
    device: &mut dyn Device,
    state: &mut PlotState,
    err: DeviceError,
    stats: PlotStatistics,
) -> PlotResult {
    error!("Plot aborted: {err}");

    match recover(device) {
        Ok(()) => {
            info!("Recovered: pen up and homed");
            *state = PlotState::Connected;
        }
        Err(recovery) => {
            error!("Recovery failed: {recovery}");
            *state = PlotState::Error;
        }
    }

    PlotResult::failed(format!("Failed to plot: {err}")).with_statistics(stats)
}
