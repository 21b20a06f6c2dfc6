//!
//! Board support for the MBot's Teensy 4.1: wiring, timers and the adapters that let the robot
//! context drive real hardware.
//!

#![no_std]

pub mod clock;
pub use clock::*;

pub mod peripherals;
pub use peripherals::*;

pub mod pi_link;
pub use pi_link::PiLink;

pub mod sensors;
pub use sensors::{GyroHeading, ImuTemperature};
