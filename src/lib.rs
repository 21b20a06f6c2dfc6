//!
//! Robot side of the MBot: the remote command protocol, the operating state machine and the
//! built in routines, tied together into a single robot context that the firmware ticks.
//!

#![no_std]

pub mod autonomous;
pub use autonomous::{Routine, RoutineStatus, Step, ROTATION_TEST, SQUARE_TEST};

pub mod clock;
pub use clock::*;

pub mod diagnostics;
pub use diagnostics::MoveTest;

pub mod drivetrain;
pub use drivetrain::UartDrivetrain;

pub mod mbot;
pub use mbot::{Activity, MBot};

pub mod protocol;
pub use protocol::{CommandProtocol, ProtocolConfig};

pub mod robot;
pub use robot::robot_config::*;
pub use robot::{RobotConfig, SpeedLevels};

pub mod serial;
pub use serial::{LinkError, SerialLink};

pub mod state;
pub use state::{RobotState, StateMachine};
