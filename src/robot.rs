//!
//! Robot Constants and Configuration Information
//!

use motion::{LocalizationConfig, MotionConfig};

use crate::protocol::ProtocolConfig;

/// Conversion from a speed percentage to a pwm target
pub const PERCENTAGE_TO_PWM_FACTOR: f32 = 2.55;
/// Manual speed selected by `h`
pub const SPEED_HIGH_PERCENT: u8 = 100;
/// Manual speed selected by `m`
pub const SPEED_MEDIUM_PERCENT: u8 = 60;
/// Manual speed selected by `l`
pub const SPEED_LOW_PERCENT: u8 = 30;
/// Speed the built in routines drive at
pub const AUTONOMOUS_SPEED_PERCENT: u8 = 50;

#[cfg(any(
    not(any(feature = "mbot-0", feature = "mbot-1")),
    feature = "mbot-0"
))]
pub mod robot_config {
    /// The Robot ID for MBot 0
    pub const ROBOT_ID: u8 = 0;
    /// Scale applied to the left wheel so both wheels turn at the same rate
    pub const MOTOR_DEVIATION_FACTOR: f32 = 0.95;
    /// Wheel travel per encoder pulse (mm)
    pub const MILLIMETERS_PER_PULSE: f32 = 0.5689;
    /// Overshoot (degrees) of a left rotation once the motors are cut
    pub const LEFT_MOMENTUM_OFFSET_DEG: i32 = 5;
    /// Overshoot (degrees) of a right rotation once the motors are cut
    pub const RIGHT_MOMENTUM_OFFSET_DEG: i32 = 5;
}

#[cfg(feature = "mbot-1")]
pub mod robot_config {
    /// The Robot ID for MBot 1
    pub const ROBOT_ID: u8 = 1;
    /// Scale applied to the left wheel so both wheels turn at the same rate
    pub const MOTOR_DEVIATION_FACTOR: f32 = 0.97;
    /// Wheel travel per encoder pulse (mm)
    pub const MILLIMETERS_PER_PULSE: f32 = 0.5689;
    /// Overshoot (degrees) of a left rotation once the motors are cut
    pub const LEFT_MOMENTUM_OFFSET_DEG: i32 = 7;
    /// Overshoot (degrees) of a right rotation once the motors are cut
    pub const RIGHT_MOMENTUM_OFFSET_DEG: i32 = 6;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Manual speed percentages for the `h`, `m` and `l` commands
pub struct SpeedLevels {
    pub high: u8,
    pub medium: u8,
    pub low: u8,
}

impl Default for SpeedLevels {
    fn default() -> Self {
        Self {
            high: SPEED_HIGH_PERCENT,
            medium: SPEED_MEDIUM_PERCENT,
            low: SPEED_LOW_PERCENT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Everything tunable about a robot
pub struct RobotConfig {
    pub motion: MotionConfig,
    pub localization: LocalizationConfig,
    pub protocol: ProtocolConfig,
    pub speeds: SpeedLevels,
    pub percentage_to_pwm: f32,
    pub autonomous_speed_percent: u8,
}

impl RobotConfig {
    /// Convert a speed percentage into a pwm target
    pub fn percentage_to_pwm(&self, percent: u8) -> f32 {
        percent as f32 * self.percentage_to_pwm
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            motion: MotionConfig {
                motor_deviation_factor: robot_config::MOTOR_DEVIATION_FACTOR,
                left_momentum_offset_deg: robot_config::LEFT_MOMENTUM_OFFSET_DEG,
                right_momentum_offset_deg: robot_config::RIGHT_MOMENTUM_OFFSET_DEG,
                ..Default::default()
            },
            localization: LocalizationConfig {
                mm_per_pulse: robot_config::MILLIMETERS_PER_PULSE,
                ..Default::default()
            },
            protocol: ProtocolConfig::default(),
            speeds: SpeedLevels::default(),
            percentage_to_pwm: PERCENTAGE_TO_PWM_FACTOR,
            autonomous_speed_percent: AUTONOMOUS_SPEED_PERCENT,
        }
    }
}
