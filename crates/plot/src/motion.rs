use serde::{Deserialize, Serialize};

/// Invalid motion parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("{name} must be between 1 and 100 percent, got {value}")]
    Speed { name: &'static str, value: u8 },

    #[error("{name} must be between 0 and 100 percent, got {value}")]
    PenPosition { name: &'static str, value: u8 },

    #[error("pen up position ({up}) must be above pen down position ({down})")]
    PenInverted { up: u8, down: u8 },
}

/// Speed, acceleration and pen servo settings, all as percentages.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub speed_pen_down: u8,
    pub speed_pen_up: u8,
    pub acceleration: u8,
    pub pen_pos_down: u8,
    pub pen_pos_up: u8,
    /// Pause after each pen lift or drop, in milliseconds.
    pub settle_ms: u32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            speed_pen_down: 20,
            speed_pen_up: 60,
            acceleration: 50,
            pen_pos_down: 30,
            pen_pos_up: 60,
            settle_ms: 0,
        }
    }
}

impl MotionConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (name, value) in [
            ("speed_pen_down", self.speed_pen_down),
            ("speed_pen_up", self.speed_pen_up),
            ("acceleration", self.acceleration),
        ] {
            if !(1..=100).contains(&value) {
                return Err(ConfigurationError::Speed { name, value });
            }
        }

        for (name, value) in [
            ("pen_pos_down", self.pen_pos_down),
            ("pen_pos_up", self.pen_pos_up),
        ] {
            if value > 100 {
                return Err(ConfigurationError::PenPosition { name, value });
            }
        }

        if self.pen_pos_up <= self.pen_pos_down {
            return Err(ConfigurationError::PenInverted {
                up: self.pen_pos_up,
                down: self.pen_pos_down,
            });
        }

        Ok(())
    }
}
