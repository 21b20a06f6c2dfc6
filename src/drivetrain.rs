//!
//! Drivetrain made of two wheel boards, each listening on its own uart
//!

use common::motor::{MotorCommand, MotorSide, Packable, PackingError, MOTOR_COMMAND_SIZE};
use embedded_hal::serial::Write;
use motion::Drivetrain;

/// Largest change in pwm a wheel makes per service step
pub const PWM_RAMP_STEP: i16 = 25;

fn ramp(current: i16, target: i16, step: i16) -> i16 {
    if current < target {
        current.saturating_add(step).min(target)
    } else {
        current.saturating_sub(step).max(target)
    }
}

/// Failure to get a frame to a wheel board
#[derive(Debug)]
enum FrameError<E> {
    Packing(PackingError),
    Uart(E),
}

/// Ramps each wheel toward its target and sends a wheel board a frame only when its pwm
/// changes.  The boards hold the last pwm they were sent.
pub struct UartDrivetrain<L, R> {
    left_uart: L,
    right_uart: R,
    ramp_step: i16,
    target: (i16, i16),
    current: (i16, i16),
    sent: (Option<i16>, Option<i16>),
}

impl<L, R, LE, RE> UartDrivetrain<L, R>
where
    L: Write<u8, Error = LE>,
    R: Write<u8, Error = RE>,
    LE: core::fmt::Debug,
    RE: core::fmt::Debug,
{
    pub fn new(left_uart: L, right_uart: R, ramp_step: i16) -> Self {
        Self {
            left_uart,
            right_uart,
            ramp_step: ramp_step.max(1),
            target: (0, 0),
            current: (0, 0),
            sent: (None, None),
        }
    }

    pub fn target_pwm(&self) -> (i16, i16) {
        self.target
    }

    pub fn uarts(&self) -> (&L, &R) {
        (&self.left_uart, &self.right_uart)
    }

    fn send<U: Write<u8, Error = UE>, UE>(
        uart: &mut U,
        command: MotorCommand,
    ) -> Result<(), FrameError<UE>> {
        let mut buffer = [0u8; MOTOR_COMMAND_SIZE];
        command.pack(&mut buffer).map_err(FrameError::Packing)?;
        for byte in buffer {
            nb::block!(uart.write(byte)).map_err(FrameError::Uart)?;
        }
        nb::block!(uart.flush()).map_err(FrameError::Uart)
    }
}

impl<L, R, LE, RE> Drivetrain for UartDrivetrain<L, R>
where
    L: Write<u8, Error = LE>,
    R: Write<u8, Error = RE>,
    LE: core::fmt::Debug,
    RE: core::fmt::Debug,
{
    fn set_target_pwm(&mut self, left: i16, right: i16) {
        self.target = (left, right);
    }

    fn service(&mut self) {
        self.current = (
            ramp(self.current.0, self.target.0, self.ramp_step),
            ramp(self.current.1, self.target.1, self.ramp_step),
        );

        let (left, right) = self.current;

        if self.sent.0 != Some(left) {
            let command = MotorCommand::drive(MotorSide::Left, left as i32);
            match Self::send(&mut self.left_uart, command) {
                Ok(()) => self.sent.0 = Some(left),
                Err(err) => log::warn!("Left wheel board frame not sent: {:?}", err),
            }
        }

        if self.sent.1 != Some(right) {
            let command = MotorCommand::drive(MotorSide::Right, right as i32);
            match Self::send(&mut self.right_uart, command) {
                Ok(()) => self.sent.1 = Some(right),
                Err(err) => log::warn!("Right wheel board frame not sent: {:?}", err),
            }
        }
    }

    fn current_pwm(&self) -> (i16, i16) {
        self.current
    }
}
