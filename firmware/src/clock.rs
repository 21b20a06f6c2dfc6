//!
//! Clock Constants and Configuration
//!

use motion::MotionControlClock;
use teensy4_bsp::{
    board::PERCLK_FREQUENCY,
    hal::gpt::{ClockSource, Gpt2},
};

/// Frequency of the GPT clocks
pub const GPT_FREQUENCY: u32 = 1_000;
/// Reference clock for the GPT clocks
pub const GPT_CLOCK_SOURCE: ClockSource = ClockSource::HighFrequencyReferenceClock;
/// Divider for the GPT clocks
pub const GPT_DIVIDER: u32 = PERCLK_FREQUENCY / GPT_FREQUENCY;
/// Microseconds between control loop ticks
pub const CONTROL_LOOP_PERIOD_US: u32 = 1_000;
/// Seconds between control loop ticks
pub const CONTROL_LOOP_PERIOD_S: f32 = CONTROL_LOOP_PERIOD_US as f32 / 1_000_000.0;
/// Stationary gyro samples averaged into the bias at boot
pub const GYRO_CALIBRATION_SAMPLES: u32 = 500;
/// Time the robot waits after boot before the control loop starts
pub const STARTUP_DELAY_MS: u32 = 1_000;
/// Baud rate of the links to the wheel boards
pub const WHEEL_BOARD_BAUD: u32 = 115_200;

/// Millisecond clock backed by a free running GPT
pub struct GptClock {
    gpt: Gpt2,
}

impl GptClock {
    /// `gpt` must already be divided down to [`GPT_FREQUENCY`] and enabled
    pub fn new(gpt: Gpt2) -> Self {
        Self { gpt }
    }
}

impl MotionControlClock for GptClock {
    fn now_ms(&mut self) -> u32 {
        self.gpt.count()
    }
}
