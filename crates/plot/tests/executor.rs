use std::sync::{Arc, Mutex};

use penscript_core::{Point, PlotPath, WorkspaceBounds};
use penscript_plot::{
    ConnectFailure, Device, DeviceError, MotionConfig, PlotExecutor, PlotState, PlotStatistics,
};

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Connect,
    Disconnect,
    PenUp,
    PenDown,
    MoveTo(f32, f32),
    LineTo(f32, f32),
    Delay(u32),
    Configure,
}

/// Records every call and fails on demand.
#[derive(Clone, Default)]
struct Recorder {
    log: Arc<Mutex<Vec<Command>>>,
    fail_connect: bool,
    /// Fail the n-th `line_to` call, counting from zero.
    fail_line: Option<usize>,
    /// Once `line_to` has failed, every later pen lift fails too.
    stuck_after_failure: bool,
    failed: Arc<Mutex<bool>>,
    fail_configure: bool,
}

impl Recorder {
    fn commands(&self) -> Vec<Command> {
        self.log.lock().unwrap().clone()
    }

    fn push(&self, command: Command) {
        self.log.lock().unwrap().push(command);
    }

    fn count(&self, wanted: &Command) -> usize {
        self.commands().iter().filter(|c| *c == wanted).count()
    }

    /// Clear an injected fault, as if the pen had been freed by hand.
    fn repair(&self) {
        *self.failed.lock().unwrap() = false;
    }

    fn lines_drawn(&self) -> usize {
        self.commands()
            .iter()
            .filter(|c| matches!(c, Command::LineTo(..)))
            .count()
    }
}

impl Device for Recorder {
    fn connect(&mut self) -> Result<(), DeviceError> {
        self.push(Command::Connect);
        if self.fail_connect {
            return Err(DeviceError::Connection {
                kind: ConnectFailure::Cabling,
                detail: "unplugged".into(),
            });
        }
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), DeviceError> {
        self.push(Command::Disconnect);
        Ok(())
    }

    fn pen_up(&mut self) -> Result<(), DeviceError> {
        self.push(Command::PenUp);
        if self.stuck_after_failure && *self.failed.lock().unwrap() {
            return Err(DeviceError::command("pen_up", "servo stalled"));
        }
        Ok(())
    }

    fn pen_down(&mut self) -> Result<(), DeviceError> {
        self.push(Command::PenDown);
        Ok(())
    }

    fn move_to(&mut self, x: f32, y: f32) -> Result<(), DeviceError> {
        self.push(Command::MoveTo(x, y));
        Ok(())
    }

    fn line_to(&mut self, x: f32, y: f32) -> Result<(), DeviceError> {
        let index = self.lines_drawn();
        self.push(Command::LineTo(x, y));
        if self.fail_line == Some(index) {
            *self.failed.lock().unwrap() = true;
            return Err(DeviceError::command("line_to", "serial timeout"));
        }
        Ok(())
    }

    fn delay(&mut self, ms: u32) -> Result<(), DeviceError> {
        self.push(Command::Delay(ms));
        Ok(())
    }

    fn configure_motion(&mut self, _config: &MotionConfig) -> Result<(), DeviceError> {
        self.push(Command::Configure);
        if self.fail_configure {
            return Err(DeviceError::command("configure_motion", "no reply"));
        }
        Ok(())
    }
}

fn path(points: &[(f32, f32)]) -> PlotPath {
    PlotPath::new(points.iter().copied().map(Point::from).collect()).unwrap()
}

fn hardware(recorder: &Recorder) -> PlotExecutor {
    PlotExecutor::hardware(
        recorder.clone(),
        WorkspaceBounds::AXIDRAW_MINI,
        MotionConfig::default(),
    )
}

#[test]
fn connecting_twice_does_not_reinitialise() {
    let recorder = Recorder::default();
    let mut executor = hardware(&recorder);

    assert!(executor.connect().success);
    let calls = recorder.commands().len();

    let again = executor.connect();
    assert!(again.success);
    assert_eq!(again.message.as_deref(), Some("Already connected"));
    assert_eq!(recorder.commands().len(), calls);
    assert_eq!(recorder.count(&Command::Connect), 1);
}

#[test]
fn failed_connection_stays_disconnected() {
    let recorder = Recorder {
        fail_connect: true,
        ..Default::default()
    };
    let mut executor = hardware(&recorder);

    let result = executor.connect();
    assert!(!result.success);
    assert!(result.error.unwrap().contains("USB cable"));
    assert_eq!(executor.state(), PlotState::Disconnected);
    assert_eq!(recorder.count(&Command::Disconnect), 1);
}

#[test]
fn plotting_needs_a_connection() {
    let recorder = Recorder::default();
    let mut executor = hardware(&recorder);

    let result = executor.plot(&[path(&[(1.0, 1.0), (2.0, 2.0)])]);
    assert!(!result.success);
    assert!(recorder.commands().is_empty());
}

#[test]
fn paths_are_drawn_then_homed() {
    let recorder = Recorder::default();
    let mut executor = hardware(&recorder);
    executor.connect();

    let result = executor.plot(&[path(&[(10.0, 10.0), (13.0, 14.0)])]);
    assert!(result.success, "{:?}", result.error);
    assert_eq!(executor.state(), PlotState::Connected);
    assert_eq!(result.statistics.paths, 1);
    assert_eq!(result.statistics.pen_movements, 2);
    assert!((result.statistics.total_distance - 5.0).abs() < 1e-6);

    let commands = recorder.commands();
    let drawing = commands
        .iter()
        .position(|c| *c == Command::MoveTo(10.0, 10.0))
        .unwrap();
    assert_eq!(
        &commands[drawing..drawing + 4],
        &[
            Command::MoveTo(10.0, 10.0),
            Command::PenDown,
            Command::LineTo(13.0, 14.0),
            Command::PenUp,
        ]
    );
    assert!(commands.contains(&Command::Configure));
    assert_eq!(commands[commands.len() - 2], Command::MoveTo(0.0, 0.0));
    assert_eq!(commands.last(), Some(&Command::PenUp));
}

#[test]
fn settle_time_follows_pen_changes() {
    let recorder = Recorder::default();
    let motion = MotionConfig {
        settle_ms: 150,
        ..Default::default()
    };
    let mut executor =
        PlotExecutor::hardware(recorder.clone(), WorkspaceBounds::AXIDRAW_MINI, motion);
    executor.connect();

    assert!(executor.plot(&[path(&[(5.0, 5.0), (6.0, 6.0)])]).success);
    assert_eq!(recorder.count(&Command::Delay(150)), 2);
}

#[test]
fn out_of_bounds_start_is_skipped() {
    let recorder = Recorder::default();
    let mut executor = hardware(&recorder);
    executor.connect();

    let result = executor.plot(&[
        path(&[(-5.0, 10.0), (10.0, 10.0), (20.0, 10.0)]),
        path(&[(30.0, 30.0), (40.0, 30.0)]),
    ]);

    assert!(result.success);
    assert_eq!(result.statistics.paths, 1);
    assert_eq!(result.statistics.skipped_paths, 1);
    assert!(result.statistics.invalid_points >= 1);
    assert!(!recorder.commands().contains(&Command::MoveTo(-5.0, 10.0)));
    assert_eq!(recorder.lines_drawn(), 1);
}

#[test]
fn stray_points_are_dropped() {
    let recorder = Recorder::default();
    let mut executor = hardware(&recorder);
    executor.connect();

    let result = executor.plot(&[path(&[(10.0, 10.0), (500.0, 10.0), (20.0, 10.0)])]);

    assert!(result.success);
    assert_eq!(result.statistics.paths, 1);
    assert_eq!(result.statistics.invalid_points, 1);
    assert!(!recorder.commands().contains(&Command::LineTo(500.0, 10.0)));
}

#[test]
fn mid_plot_failure_recovers() {
    let recorder = Recorder {
        fail_line: Some(1),
        ..Default::default()
    };
    let mut executor = hardware(&recorder);
    executor.connect();

    let result = executor.plot(&[
        path(&[(10.0, 10.0), (20.0, 10.0)]),
        path(&[(30.0, 30.0), (40.0, 30.0)]),
        path(&[(50.0, 50.0), (60.0, 50.0)]),
    ]);

    assert!(!result.success);
    assert!(result.error.unwrap().starts_with("Failed to plot"));
    assert_eq!(result.statistics.paths, 1);
    assert_eq!(executor.state(), PlotState::Connected);

    let commands = recorder.commands();
    assert!(!commands.contains(&Command::MoveTo(50.0, 50.0)));
    assert_eq!(commands.last(), Some(&Command::PenUp));
    assert_eq!(commands[commands.len() - 2], Command::MoveTo(0.0, 0.0));
}

#[test]
fn failed_recovery_enters_error_state() {
    let recorder = Recorder {
        fail_line: Some(0),
        stuck_after_failure: true,
        ..Default::default()
    };
    let mut executor = hardware(&recorder);
    executor.connect();

    let result = executor.plot(&[path(&[(10.0, 10.0), (20.0, 10.0)])]);
    assert!(!result.success);
    assert_eq!(executor.state(), PlotState::Error);

    // The drawing failure is reported, not the pen lift that failed after it.
    let error = result.error.unwrap();
    assert!(error.contains("line_to"), "{error}");
    assert!(!error.contains("servo stalled"), "{error}");

    assert!(!executor.plot(&[]).success);
}

#[test]
fn reconnect_leaves_error_state() {
    let recorder = Recorder {
        fail_line: Some(0),
        stuck_after_failure: true,
        ..Default::default()
    };
    let mut executor = hardware(&recorder);
    executor.connect();
    executor.plot(&[path(&[(10.0, 10.0), (20.0, 10.0)])]);
    assert_eq!(executor.state(), PlotState::Error);

    recorder.repair();
    let before = recorder.commands().len();
    let result = executor.connect();
    assert!(result.success, "{:?}", result.error);
    assert_eq!(executor.state(), PlotState::Connected);

    assert_eq!(
        &recorder.commands()[before..],
        &[Command::Disconnect, Command::Connect, Command::PenUp]
    );

    let result = executor.plot(&[path(&[(30.0, 30.0), (40.0, 30.0)])]);
    assert!(result.success, "{:?}", result.error);
}

#[test]
fn motion_setup_failure_is_recovered() {
    let recorder = Recorder {
        fail_configure: true,
        ..Default::default()
    };
    let mut executor = hardware(&recorder);
    executor.connect();

    let result = executor.plot(&[path(&[(10.0, 10.0), (20.0, 10.0)])]);
    assert!(!result.success);
    assert!(result.error.unwrap().contains("configure_motion"));
    assert_eq!(result.statistics, PlotStatistics::default());
    assert_eq!(recorder.lines_drawn(), 0);
    assert_eq!(executor.state(), PlotState::Connected);

    let commands = recorder.commands();
    assert_eq!(commands.last(), Some(&Command::PenUp));
    assert_eq!(commands[commands.len() - 2], Command::MoveTo(0.0, 0.0));
}

#[test]
fn invalid_motion_is_refused() {
    let recorder = Recorder::default();
    let motion = MotionConfig {
        speed_pen_down: 0,
        ..Default::default()
    };
    let mut executor =
        PlotExecutor::hardware(recorder.clone(), WorkspaceBounds::AXIDRAW_MINI, motion);
    executor.connect();

    let result = executor.plot(&[path(&[(10.0, 10.0), (20.0, 10.0)])]);
    assert!(!result.success);
    assert!(result.error.unwrap().contains("speed_pen_down"));
    assert_eq!(recorder.lines_drawn(), 0);
    assert_eq!(executor.state(), PlotState::Connected);
}

#[test]
fn simulated_empty_plot() {
    let mut executor = PlotExecutor::simulated(WorkspaceBounds::AXIDRAW_MINI);
    executor.connect();

    let result = executor.plot(&[]);
    assert!(result.success);
    assert_eq!(result.statistics, PlotStatistics::default());
}

#[test]
fn results_serialise_to_json() {
    let mut executor = PlotExecutor::simulated(WorkspaceBounds::AXIDRAW_MINI);
    executor.connect();
    let result = executor.plot(&[path(&[(0.0, 0.0), (3.0, 4.0)])]);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["statistics"]["paths"], 1);
    assert_eq!(json["statistics"]["total_distance"], 5.0);
    assert!(json.get("error").is_none());
    assert!(json["log"].as_array().unwrap().len() > 2);

    let failure = serde_json::to_value(PlotExecutor::simulated(Default::default()).plot(&[]))
        .unwrap();
    assert_eq!(failure["success"], false);
    assert!(failure.get("message").is_none());
}
