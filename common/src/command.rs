//!
//! Commands received from the remote controller
//!
//! Every command is a single line of ASCII text.  Surrounding whitespace is
//! ignored but matching is exact and case sensitive.
//!

use defmt::Format;

#[derive(Format, Debug, PartialEq, Eq, Clone, Copy)]
/// A parsed inbound line
pub enum Command {
    /// `hello`
    Hello,
    /// `r` enter standby and reset the position estimate
    Standby,
    /// `c` enter manual control with the robot stopped
    ManualStop,
    /// `w`
    ManualForward,
    /// `s`
    ManualBackward,
    /// `a`
    ManualLeft,
    /// `d`
    ManualRight,
    /// `h`
    SetSpeedHigh,
    /// `m`
    SetSpeedMedium,
    /// `l`
    SetSpeedLow,
    /// Anything that is not one of the above
    Error,
}

impl Default for Command {
    fn default() -> Self {
        Self::Error
    }
}

impl Command {
    /// Classify a line of text.  The line terminator may or may not still be attached.
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "hello" => Self::Hello,
            "r" => Self::Standby,
            "c" => Self::ManualStop,
            "w" => Self::ManualForward,
            "s" => Self::ManualBackward,
            "a" => Self::ManualLeft,
            "d" => Self::ManualRight,
            "h" => Self::SetSpeedHigh,
            "m" => Self::SetSpeedMedium,
            "l" => Self::SetSpeedLow,
            _ => Self::Error,
        }
    }

    /// Whether the robot answers this command with an acknowledgment
    pub fn is_acknowledged(&self) -> bool {
        !matches!(self, Self::Error)
    }

    /// The text this command is sent as
    pub fn token(&self) -> Option<&'static str> {
        match self {
            Self::Hello => Some("hello"),
            Self::Standby => Some("r"),
            Self::ManualStop => Some("c"),
            Self::ManualForward => Some("w"),
            Self::ManualBackward => Some("s"),
            Self::ManualLeft => Some("a"),
            Self::ManualRight => Some("d"),
            Self::SetSpeedHigh => Some("h"),
            Self::SetSpeedMedium => Some("m"),
            Self::SetSpeedLow => Some("l"),
            Self::Error => None,
        }
    }
}
