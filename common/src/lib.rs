//!
//! Types shared between the robot and whatever is on the other end of its links
//!

#![no_std]

pub mod command;
pub use command::Command;

pub mod reply;
pub use reply::{LINE_ENDING, Reply};

pub mod motor;
