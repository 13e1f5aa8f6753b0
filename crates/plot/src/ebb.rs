//! EiBotBoard driver, the controller inside AxiDraw plotters.
//!
//! Commands are ASCII lines terminated by `\r`. Most answer `OK\r\n`; the
//! version query answers with a free-form banner.

use std::io::{self, Read, Write};
use std::time::Duration;

use log::{debug, info, trace};
use serialport::{SerialPort, SerialPortType};

use crate::device::{ConnectFailure, Device, DeviceError};
use crate::motion::MotionConfig;

/// Microchip vendor ID used by the EiBotBoard.
pub const EBB_VID: u16 = 0x04D8;
pub const EBB_PID: u16 = 0xFD92;

const BAUD_RATE: u32 = 115_200;
const TIMEOUT: Duration = Duration::from_secs(1);

/// 1/16 microstepping on the AxiDraw belts.
const STEPS_PER_MM: f64 = 80.0;

/// Travel speed at 100 percent, in millimetres per second.
const MAX_SPEED_MM_S: f64 = 100.0;

/// Servo pulse range for pen positions 0 and 100 percent.
const SERVO_MIN: u32 = 7_500;
const SERVO_MAX: u32 = 28_000;

/// `SM` refuses durations outside this range.
const MAX_MOVE_MS: u32 = 16_777_215;

fn servo_position(percent: u8) -> u32 {
    SERVO_MIN + (SERVO_MAX - SERVO_MIN) * u32::from(percent.min(100)) / 100
}

/// Find the first serial port that enumerates as an EiBotBoard.
pub fn find_port() -> Result<String, DeviceError> {
    let ports = serialport::available_ports().map_err(|err| DeviceError::Connection {
        kind: ConnectFailure::Driver,
        detail: err.to_string(),
    })?;

    ports
        .into_iter()
        .find(|port| {
            matches!(&port.port_type, SerialPortType::UsbPort(usb)
                if usb.vid == EBB_VID && usb.pid == EBB_PID)
        })
        .map(|port| port.port_name)
        .ok_or_else(|| DeviceError::Connection {
            kind: ConnectFailure::Cabling,
            detail: "no EiBotBoard found on USB".into(),
        })
}

pub struct EbbDevice {
    /// `None` means auto-detect on connect.
    port_name: Option<String>,
    port: Option<Box<dyn SerialPort>>,
    /// Carriage position in motor steps, relative to home.
    position: (i64, i64),
    motion: MotionConfig,
}

impl EbbDevice {
    /// A device on a named port, or the first EiBotBoard found.
    pub fn new(port_name: Option<String>) -> Self {
        Self {
            port_name,
            port: None,
            position: (0, 0),
            motion: MotionConfig::default(),
        }
    }

    fn port(&mut self, command: &'static str) -> Result<&mut Box<dyn SerialPort>, DeviceError> {
        self.port
            .as_mut()
            .ok_or_else(|| DeviceError::command(command, "not connected"))
    }

    fn read_line(port: &mut dyn SerialPort) -> io::Result<String> {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            match port.read(&mut byte)? {
                0 => return Err(io::ErrorKind::UnexpectedEof.into()),
                _ if byte[0] == b'\n' => break,
                _ => line.push(byte[0]),
            }
        }

        Ok(String::from_utf8_lossy(&line).trim().to_owned())
    }

    /// Send one command line and return the reply line.
    fn query(&mut self, name: &'static str, line: &str) -> Result<String, DeviceError> {
        let port = self.port(name)?;
        trace!("EBB > {line}");

        port.write_all(line.as_bytes())?;
        port.write_all(b"\r")?;
        port.flush()?;

        let reply = Self::read_line(&mut **port)?;
        trace!("EBB < {reply}");
        Ok(reply)
    }

    fn command(&mut self, name: &'static str, line: &str) -> Result<(), DeviceError> {
        let reply = self.query(name, line)?;
        if reply.contains("OK") {
            Ok(())
        } else {
            Err(DeviceError::command(name, format!("unexpected reply {reply:?}")))
        }
    }

    /// Move the carriage to `(x, y)` millimetres at `speed` percent.
    fn travel(&mut self, name: &'static str, x: f32, y: f32, speed: u8) -> Result<(), DeviceError> {
        let target = (
            (x as f64 * STEPS_PER_MM).round() as i64,
            (y as f64 * STEPS_PER_MM).round() as i64,
        );
        let dx = target.0 - self.position.0;
        let dy = target.1 - self.position.1;
        if dx == 0 && dy == 0 {
            return Ok(());
        }

        let distance_mm = (dx as f64).hypot(dy as f64) / STEPS_PER_MM;
        let speed_mm_s = MAX_SPEED_MM_S * f64::from(speed.max(1)) / 100.0;
        let duration = ((distance_mm / speed_mm_s) * 1000.0).ceil().clamp(1.0, MAX_MOVE_MS as f64) as u32;

        // CoreXY: each motor moves along a diagonal.
        let motor1 = dx + dy;
        let motor2 = dx - dy;

        self.command(name, &format!("SM,{duration},{motor1},{motor2}"))?;
        self.position = target;
        Ok(())
    }
}

impl Device for EbbDevice {
    fn connect(&mut self) -> Result<(), DeviceError> {
        let port_name = match &self.port_name {
            Some(name) => name.clone(),
            None => find_port()?,
        };

        info!("Opening EiBotBoard on {port_name}");
        let port = serialport::new(&port_name, BAUD_RATE)
            .timeout(TIMEOUT)
            .open()
            .map_err(|err| DeviceError::Connection {
                kind: match err.kind() {
                    serialport::ErrorKind::NoDevice => ConnectFailure::Cabling,
                    _ => ConnectFailure::Driver,
                },
                detail: format!("{port_name}: {err}"),
            })?;
        self.port = Some(port);
        self.position = (0, 0);

        let version = self.query("version", "V").map_err(|err| match err {
            DeviceError::Io(io) if io.kind() == io::ErrorKind::TimedOut => {
                DeviceError::Connection {
                    kind: ConnectFailure::Power,
                    detail: "no reply to version query".into(),
                }
            }
            other => other,
        })?;
        info!("EiBotBoard firmware: {version}");

        self.command("enable_motors", "EM,1,1")
    }

    fn disconnect(&mut self) -> Result<(), DeviceError> {
        if self.port.is_none() {
            return Ok(());
        }

        let result = self.command("disable_motors", "EM,0,0");
        self.port = None;
        debug!("Closed EiBotBoard port");
        result
    }

    fn pen_up(&mut self) -> Result<(), DeviceError> {
        self.command("pen_up", "SP,1")
    }

    fn pen_down(&mut self) -> Result<(), DeviceError> {
        self.command("pen_down", "SP,0")
    }

    fn move_to(&mut self, x: f32, y: f32) -> Result<(), DeviceError> {
        let speed = self.motion.speed_pen_up;
        self.travel("move_to", x, y, speed)
    }

    fn line_to(&mut self, x: f32, y: f32) -> Result<(), DeviceError> {
        let speed = self.motion.speed_pen_down;
        self.travel("line_to", x, y, speed)
    }

    fn delay(&mut self, ms: u32) -> Result<(), DeviceError> {
        if ms == 0 {
            return Ok(());
        }
        self.command("delay", &format!("SM,{},0,0", ms.min(MAX_MOVE_MS)))
    }

    fn configure_motion(&mut self, config: &MotionConfig) -> Result<(), DeviceError> {
        config.validate()?;

        self.command("pen_up_position", &format!("SC,4,{}", servo_position(config.pen_pos_up)))?;
        self.command(
            "pen_down_position",
            &format!("SC,5,{}", servo_position(config.pen_pos_down)),
        )?;

        // SM moves run at constant speed, so acceleration has nothing to drive.
        debug!(
            "Ignoring acceleration {}%: EBB moves are not ramped",
            config.acceleration
        );

        self.motion = *config;
        debug!("Motion configured: {config:?}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn servo_range_is_linear() {
        assert_eq!(servo_position(0), SERVO_MIN);
        assert_eq!(servo_position(100), SERVO_MAX);
        assert_eq!(servo_position(50), 17_750);
        assert_eq!(servo_position(200), SERVO_MAX);
    }

    #[test]
    fn commands_need_a_connection() {
        let mut device = EbbDevice::new(Some("/dev/null-plotter".into()));
        assert!(matches!(
            device.pen_up(),
            Err(DeviceError::Command { command: "pen_up", .. })
        ));
        assert!(device.disconnect().is_ok());
    }
}
