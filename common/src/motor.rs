//!
//! Common interfaces for the wheel boards
//!

use defmt::Format;
pub use ncomm_utils::packing::{Packable, PackingError};

/// The size (in bytes) of a wheel command frame
pub const MOTOR_COMMAND_SIZE: usize = 5;
/// Start byte addressing the left wheel board
pub const LEFT_MOTOR_START_BYTE: u8 = 0x11;
/// Start byte addressing the right wheel board
pub const RIGHT_MOTOR_START_BYTE: u8 = 0x22;

#[derive(Format, Debug, PartialEq, Eq, Clone, Copy)]
/// Which wheel board a frame is addressed to
pub enum MotorSide {
    Left,
    Right,
}

impl MotorSide {
    /// The start byte for this side's board
    pub const fn start_byte(self) -> u8 {
        match self {
            Self::Left => LEFT_MOTOR_START_BYTE,
            Self::Right => RIGHT_MOTOR_START_BYTE,
        }
    }
}

#[derive(Format, Debug, PartialEq, Eq, Clone, Copy)]
/// Commands that can be sent to a wheel board
pub enum MotorCommand {
    /// Set the output of a single wheel board
    Drive {
        /// The board this command is for
        side: MotorSide,
        /// Signed pwm output (-255..=255)
        pwm: i32,
    },
    /// A frame whose start byte addresses neither board
    Unknown,
}

impl MotorCommand {
    pub const fn drive(side: MotorSide, pwm: i32) -> Self {
        Self::Drive { side, pwm }
    }
}

impl Default for MotorCommand {
    fn default() -> Self {
        Self::Drive {
            side: MotorSide::Left,
            pwm: 0,
        }
    }
}

impl Packable for MotorCommand {
    fn len() -> usize {
        MOTOR_COMMAND_SIZE
    }

    /// Packed as `[start byte, pwm (little endian i32)]`
    fn pack(self, buffer: &mut [u8]) -> Result<(), PackingError> {
        if buffer.len() < Self::len() {
            return Err(PackingError::InvalidBufferSize);
        }

        match self {
            Self::Drive { side, pwm } => {
                buffer[0] = side.start_byte();
                buffer[1..MOTOR_COMMAND_SIZE].copy_from_slice(&pwm.to_le_bytes());
            }
            Self::Unknown => (),
        }

        Ok(())
    }

    fn unpack(data: &[u8]) -> Result<Self, PackingError> {
        if data.len() < Self::len() {
            return Err(PackingError::InvalidBufferSize);
        }

        let side = match data[0] {
            LEFT_MOTOR_START_BYTE => MotorSide::Left,
            RIGHT_MOTOR_START_BYTE => MotorSide::Right,
            _ => return Ok(Self::Unknown),
        };

        let mut pwm = [0u8; 4];
        pwm.copy_from_slice(&data[1..MOTOR_COMMAND_SIZE]);

        Ok(Self::Drive {
            side,
            pwm: i32::from_le_bytes(pwm),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pack_left_command() {
        let mut buffer = [0u8; MOTOR_COMMAND_SIZE];
        MotorCommand::drive(MotorSide::Left, -2)
            .pack(&mut buffer)
            .unwrap();
        assert_eq!(buffer, [0x11, 0xFE, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_unpack_right_command() {
        let command = MotorCommand::unpack(&[0x22, 0xFF, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(command, MotorCommand::drive(MotorSide::Right, 255));
    }

    #[test]
    fn test_short_buffer() {
        let mut buffer = [0u8; 3];
        assert!(matches!(
            MotorCommand::drive(MotorSide::Right, 0).pack(&mut buffer),
            Err(PackingError::InvalidBufferSize),
        ));
        assert!(matches!(
            MotorCommand::unpack(&buffer),
            Err(PackingError::InvalidBufferSize),
        ));
    }

    #[test]
    fn test_unknown_start_byte() {
        assert_eq!(
            MotorCommand::unpack(&[0x33, 0, 0, 0, 0]).unwrap(),
            MotorCommand::Unknown,
        );
    }
}
