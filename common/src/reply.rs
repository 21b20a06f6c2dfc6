//!
//! Lines sent back to the remote controller
//!

use core::fmt::{self, Display, Formatter};
use defmt::Format;

/// Every outbound line is terminated with a carriage return and a newline
pub const LINE_ENDING: &str = "\r\n";

#[derive(Format, Debug, PartialEq, Eq, Clone, Copy)]
/// An outbound line (without its terminator)
pub enum Reply<'a> {
    /// `<text>!` the command was understood and carried out
    Ack(&'a str),
    /// `<text>?` the command was not understood
    Nok(&'a str),
    /// `t:<value>` board temperature in degrees celsius
    Temperature(i32),
    /// `p:<x>,<y>` position estimate in millimeters
    Position { x: i32, y: i32 },
    /// `d:ok` or `d:fail:<code>,...` result of the drive self test
    Diagnostics(&'a [u8]),
}

impl<'a> Display for Reply<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ack(text) => write!(f, "{}!", text.trim()),
            Self::Nok(text) => write!(f, "{}?", text.trim()),
            Self::Temperature(value) => write!(f, "t:{}", value),
            Self::Position { x, y } => write!(f, "p:{},{}", x, y),
            Self::Diagnostics([]) => f.write_str("d:ok"),
            Self::Diagnostics(codes) => {
                f.write_str("d:fail:")?;
                for (idx, code) in codes.iter().enumerate() {
                    if idx != 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", code)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::string::ToString;

    use super::*;

    #[test]
    fn test_ack_trims() {
        assert_eq!(Reply::Ack("hello\n").to_string(), "hello!");
        assert_eq!(Reply::Ack(" w ").to_string(), "w!");
    }

    #[test]
    fn test_nok() {
        assert_eq!(Reply::Nok("zzz").to_string(), "zzz?");
    }

    #[test]
    fn test_telemetry() {
        assert_eq!(Reply::Temperature(-3).to_string(), "t:-3");
        assert_eq!(Reply::Position { x: -120, y: 45 }.to_string(), "p:-120,45");
    }

    #[test]
    fn test_diagnostics() {
        assert_eq!(Reply::Diagnostics(&[]).to_string(), "d:ok");
        assert_eq!(Reply::Diagnostics(&[3]).to_string(), "d:fail:3");
        assert_eq!(Reply::Diagnostics(&[1, 2, 4]).to_string(), "d:fail:1,2,4");
    }
}
