//!
//! Motion control and dead reckoning for a two wheeled differential drive robot.
//!
//! Nothing in here touches hardware directly.  The wheels, the gyro and the clock are reached
//! through the traits in [`peripherals`] and [`motion_control_clock`], which keeps every
//! algorithm testable on the host.
//!

#![no_std]

pub mod encoder;
pub use encoder::{EncoderCounters, QuadratureDecoder, Wheel};

pub mod localization;
pub use localization::{LocalizationConfig, LocalizationEngine, Position};

pub mod maneuver;
pub use maneuver::{Maneuver, Progress, Snapshot};

pub mod motion_control;
pub use motion_control::{full_circles_needed, MotionConfig, MotionController};

pub mod motion_control_clock;
pub use motion_control_clock::MotionControlClock;

pub mod peripherals;
pub use peripherals::{Drivetrain, HeadingSource, TemperatureSource};

/// The largest magnitude a wheel pwm target can take
pub const MAX_PWM: i16 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// The direction the robot is being driven in
pub enum Direction {
    /// Stopped.  Both wheel targets are zero.
    #[default]
    None,
    Forward,
    Backward,
    /// Spin counterclockwise in place
    Left,
    /// Spin clockwise in place
    Right,
}

impl Direction {
    /// Sign applied to the (left, right) wheel for this direction.
    ///
    /// The wheels are mounted mirrored, so driving forward spins the left wheel
    /// backward relative to the right one.
    pub const fn wheel_signs(self) -> (f32, f32) {
        match self {
            Self::None => (0.0, 0.0),
            Self::Forward => (-1.0, 1.0),
            Self::Backward => (1.0, -1.0),
            Self::Left => (-1.0, -1.0),
            Self::Right => (1.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A spin direction for in place rotations
pub enum Turn {
    Left,
    Right,
}

impl From<Turn> for Direction {
    fn from(turn: Turn) -> Self {
        match turn {
            Turn::Left => Self::Left,
            Turn::Right => Self::Right,
        }
    }
}

impl TryFrom<Direction> for Turn {
    type Error = MotionError;

    fn try_from(direction: Direction) -> Result<Self, Self::Error> {
        match direction {
            Direction::Left => Ok(Self::Left),
            Direction::Right => Ok(Self::Right),
            other => Err(MotionError::InvalidTurnDirection(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Errors building a maneuver
pub enum MotionError {
    /// Rotations only make sense to the left or the right
    InvalidTurnDirection(Direction),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_from_direction() {
        assert_eq!(Turn::try_from(Direction::Left), Ok(Turn::Left));
        assert_eq!(Turn::try_from(Direction::Right), Ok(Turn::Right));
        assert_eq!(
            Turn::try_from(Direction::Forward),
            Err(MotionError::InvalidTurnDirection(Direction::Forward)),
        );
        assert_eq!(
            Turn::try_from(Direction::None),
            Err(MotionError::InvalidTurnDirection(Direction::None)),
        );
    }

    #[test]
    fn test_direction_from_turn() {
        assert_eq!(Direction::from(Turn::Left), Direction::Left);
        assert_eq!(Direction::from(Turn::Right), Direction::Right);
    }
}
