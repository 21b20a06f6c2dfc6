//!
//! Peripheral Type and Wiring Definitions to ensure
//! the firmware is correctly wired at compile time.
//!

use teensy4_bsp::board::{self, Lpi2c1, PERCLK_FREQUENCY};
use teensy4_bsp::hal::{
    gpio::{Input, Port},
    pit::Pit2,
    timer::Blocking,
};
use teensy4_pins::t41::*;

use mbot_rustware::{MBot, UartDrivetrain};
use shared_bus::{CortexMMutex, I2cProxy};

use crate::{GptClock, GyroHeading, ImuTemperature, PiLink};

/// The uart connected to the Raspberry Pi
pub type PiUart = board::Lpuart6;
/// The uart connected to the left wheel board
pub type LeftWheelUart = board::Lpuart4;
/// The uart connected to the right wheel board
pub type RightWheelUart = board::Lpuart8;
/// Both wheel boards
pub type WheelBoards = UartDrivetrain<LeftWheelUart, RightWheelUart>;
/// The fourth GPIO port, home of the encoder pins
pub type Gpio4 = Port<4>;
/// Left encoder channel a (the edge pin)
pub type LeftEncoderA = Input<P2>;
/// Left encoder channel b
pub type LeftEncoderB = Input<P3>;
/// Right encoder channel a (the edge pin)
pub type RightEncoderA = Input<P4>;
/// Right encoder channel b
pub type RightEncoderB = Input<P5>;
/// One handle on the I2C bus the IMU sits on
pub type ImuBus = I2cProxy<'static, CortexMMutex<Lpi2c1>>;
/// The PIT-defined delay for initializing the IMU
pub type PitDelay = Blocking<Pit2, PERCLK_FREQUENCY>;
/// The robot, wired to this board
pub type Robot = MBot<
    'static,
    PiLink,
    WheelBoards,
    GyroHeading<ImuBus>,
    ImuTemperature<ImuBus>,
    GptClock,
>;
