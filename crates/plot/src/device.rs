use std::fmt;

use crate::motion::{ConfigurationError, MotionConfig};

/// Broad cause of a failed connection, used to point the user at a fix.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConnectFailure {
    /// No device is visible: cable or port problem.
    Cabling,
    /// The device is visible but does not answer.
    Power,
    /// The port exists but cannot be opened.
    Driver,
}

impl ConnectFailure {
    /// Steps the user can take to fix this kind of failure.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Cabling => {
                "Please check:\n1. USB cable is properly connected\n2. The correct port is selected\n3. No other software is using the device"
            }
            Self::Power => {
                "Please check:\n1. The plotter is powered on\n2. The power supply is plugged in\n3. The USB connection is secure"
            }
            Self::Driver => {
                "Please check:\n1. Correct drivers are installed\n2. You have permission to open the serial port\n3. No other software is using the device"
            }
        }
    }
}

impl fmt::Display for ConnectFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cabling => "device not found",
            Self::Power => "device not responding",
            Self::Driver => "could not open device",
        })
    }
}

/// Errors reported by a plotter device.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("{kind}: {detail}")]
    Connection { kind: ConnectFailure, detail: String },

    #[error("{command} failed: {detail}")]
    Command {
        command: &'static str,
        detail: String,
    },

    #[error("invalid motion configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("device I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeviceError {
    pub fn command(command: &'static str, detail: impl Into<String>) -> Self {
        Self::Command {
            command,
            detail: detail.into(),
        }
    }

    /// A user-facing message with troubleshooting steps for connection
    /// problems.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Connection { kind, .. } => format!("{self}\n{}", kind.advice()),
            other => format!(
                "Connection failed: {other}\nPlease ensure:\n1. USB connection is secure\n2. Device is powered on\n3. Correct drivers are installed"
            ),
        }
    }
}

/// The primitives a physical plotter exposes.
///
/// Coordinates are millimetres in the workspace frame. Every method may fail
/// and must report the failure rather than silently doing nothing.
pub trait Device {
    /// Open the link and put the device into interactive motion mode.
    fn connect(&mut self) -> Result<(), DeviceError>;
    fn disconnect(&mut self) -> Result<(), DeviceError>;
    fn pen_up(&mut self) -> Result<(), DeviceError>;
    fn pen_down(&mut self) -> Result<(), DeviceError>;
    /// Travel to a point without drawing.
    fn move_to(&mut self, x: f32, y: f32) -> Result<(), DeviceError>;
    /// Draw a straight line to a point.
    fn line_to(&mut self, x: f32, y: f32) -> Result<(), DeviceError>;
    fn delay(&mut self, ms: u32) -> Result<(), DeviceError>;
    fn configure_motion(&mut self, config: &MotionConfig) -> Result<(), DeviceError>;
}

impl<D: Device + ?Sized> Device for Box<D> {
    fn connect(&mut self) -> Result<(), DeviceError> {
        (**self).connect()
    }

    fn disconnect(&mut self) -> Result<(), DeviceError> {
        (**self).disconnect()
    }

    fn pen_up(&mut self) -> Result<(), DeviceError> {
        (**self).pen_up()
    }

    fn pen_down(&mut self) -> Result<(), DeviceError> {
        (**self).pen_down()
    }

    fn move_to(&mut self, x: f32, y: f32) -> Result<(), DeviceError> {
        (**self).move_to(x, y)
    }

    fn line_to(&mut self, x: f32, y: f32) -> Result<(), DeviceError> {
        (**self).line_to(x, y)
    }

    fn delay(&mut self, ms: u32) -> Result<(), DeviceError> {
        (**self).delay(ms)
    }

    fn configure_motion(&mut self, config: &MotionConfig) -> Result<(), DeviceError> {
        (**self).configure_motion(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_diagnostic_names_the_fix() {
        let err = DeviceError::Connection {
            kind: ConnectFailure::Cabling,
            detail: "no EiBotBoard on USB".into(),
        };
        let message = err.diagnostic();
        assert!(message.starts_with("device not found: no EiBotBoard on USB"));
        assert!(message.contains("USB cable"));

        let err = DeviceError::Connection {
            kind: ConnectFailure::Driver,
            detail: "permission denied".into(),
        };
        assert!(err.diagnostic().contains("drivers"));
    }

    #[test]
    fn other_errors_get_generic_advice() {
        let err = DeviceError::command("pen_up", "timed out");
        let message = err.diagnostic();
        assert!(message.contains("pen_up failed: timed out"));
        assert!(message.contains("powered on"));
    }
}
