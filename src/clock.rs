//!
//! Clock Constants and Configuration
//!

/// Baud rate of the link to the remote controller
pub const SERIAL_BAUD: u32 = 57_600;
/// Milliseconds between reads of the serial link
pub const SERIAL_POLL_INTERVAL_MS: u32 = 10;
/// Consecutive empty polls before the robot is stopped
pub const MAX_MISSED_POLLS: u32 = 30;
/// Control loop ticks between temperature reports
pub const TICKS_BETWEEN_TEMPERATURE_REPORTS: u32 = 50_000;
/// Pause between the legs of a built in routine
pub const ROUTINE_PAUSE_MS: i32 = 3_000;
/// How long each direction is driven (and then held stopped) by the move test
pub const MOVE_TEST_PHASE_MS: u32 = 1_000;

pub use motion::localization::LOCALIZATION_TICK_MS;
