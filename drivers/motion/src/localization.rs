//!
//! Dead reckoning.
//!
//! On a fixed schedule the engine averages the heading over the interval, turns the wheel
//! pulses counted since the last update into a distance and projects it onto an integer
//! millimeter grid.  It is the only consumer of the encoder counters: every update takes
//! (reads and zeroes) them.
//!

use libm::{cosf, sinf};

use crate::{
    encoder::{average_pulses, EncoderCounters},
    motion_control_clock::elapsed_ms,
};

/// Milliseconds between position updates
pub const LOCALIZATION_TICK_MS: u32 = 200;
/// Degrees between the gyro's zero and the robot's drive axis
pub const MOUNTING_OFFSET_DEG: f32 = 90.0;
/// Millimeters travelled per encoder pulse
pub const MILLIMETERS_PER_PULSE: f32 = 0.5689;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalizationConfig {
    pub tick_interval_ms: u32,
    pub mounting_offset_deg: f32,
    pub mm_per_pulse: f32,
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: LOCALIZATION_TICK_MS,
            mounting_offset_deg: MOUNTING_OFFSET_DEG,
            mm_per_pulse: MILLIMETERS_PER_PULSE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Position estimate in millimeters from where the robot was last reset
pub struct Position {
    pub x: i32,
    pub y: i32,
}

pub struct LocalizationEngine {
    config: LocalizationConfig,
    position: Position,
    heading_start: f32,
    heading_end: f32,
    last_tick_ms: Option<u32>,
    // Signed distance folded into the position so far
    odometer_mm: f32,
}

impl LocalizationEngine {
    pub fn new(config: LocalizationConfig) -> Self {
        Self {
            config,
            position: Position::default(),
            heading_start: 0.0,
            heading_end: 0.0,
            last_tick_ms: None,
            odometer_mm: 0.0,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// The (start, end) heading of the last update interval
    pub fn heading_sample(&self) -> (f32, f32) {
        (self.heading_start, self.heading_end)
    }

    /// Move the position back to the origin
    pub fn reset(&mut self) {
        log::info!("Position reset from ({}, {})", self.position.x, self.position.y);
        self.position = Position::default();
    }

    /// Start the next interval from `heading`
    pub fn reset_heading(&mut self, heading: f32) {
        self.heading_start = heading;
        self.heading_end = heading;
    }

    /// Signed distance driven since boot, including pulses not yet folded into the position
    pub fn odometer_mm(&self, counters: &EncoderCounters) -> f32 {
        self.odometer_mm + average_pulses(counters.peek()) * self.config.mm_per_pulse
    }

    /// Update the position if the update interval has passed
    pub fn tick(
        &mut self,
        now_ms: u32,
        heading: f32,
        counters: &EncoderCounters,
    ) -> Option<Position> {
        if let Some(last) = self.last_tick_ms {
            if elapsed_ms(now_ms, last) <= self.config.tick_interval_ms {
                return None;
            }
        }

        self.last_tick_ms = Some(now_ms);
        Some(self.update_position(heading, counters))
    }

    /// Fold the pulses counted since the last update into the position, unconditionally
    pub fn update_position(&mut self, heading: f32, counters: &EncoderCounters) -> Position {
        self.heading_end = heading;
        let average_heading = (self.heading_start + self.heading_end) * 0.5;
        let angle = (average_heading + self.config.mounting_offset_deg).to_radians();

        let pulses = counters.take();
        let distance = average_pulses(pulses) * self.config.mm_per_pulse;
        self.odometer_mm += distance;

        self.position.x = (self.position.x as f32 + distance * -cosf(angle)) as i32;
        self.position.y = (self.position.y as f32 + distance * -sinf(angle)) as i32;
        self.heading_start = self.heading_end;

        log::trace!(
            "Pulses {:?} heading {} -> ({}, {})",
            pulses,
            average_heading,
            self.position.x,
            self.position.y
        );

        self.position
    }
}

impl Default for LocalizationEngine {
    fn default() -> Self {
        Self::new(LocalizationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Wheel;

    fn unit_engine() -> LocalizationEngine {
        LocalizationEngine::new(LocalizationConfig {
            mm_per_pulse: 1.0,
            ..Default::default()
        })
    }

    #[test]
    fn test_zero_pulses_leave_position() {
        let mut engine = unit_engine();
        let counters = EncoderCounters::new();
        assert_eq!(engine.update_position(37.0, &counters), Position::default());
        assert_eq!(counters.peek(), (0, 0));
    }

    #[test]
    fn test_straight_at_zero_heading() {
        let mut engine = unit_engine();
        let counters = EncoderCounters::new();
        counters.record(Wheel::Left, 100);
        counters.record(Wheel::Right, 100);

        assert_eq!(engine.update_position(0.0, &counters), Position { x: 0, y: -100 });
        assert_eq!(counters.peek(), (0, 0));
    }

    #[test]
    fn test_heading_is_averaged_over_the_interval() {
        let mut engine = unit_engine();
        let counters = EncoderCounters::new();
        engine.reset_heading(-60.0);
        counters.record(Wheel::Left, 50);
        counters.record(Wheel::Right, 50);

        // (-60 + -120) / 2 = -90, plus the mounting offset points along x
        assert_eq!(engine.update_position(-120.0, &counters), Position { x: -50, y: 0 });
        assert_eq!(engine.heading_sample(), (-120.0, -120.0));
    }

    #[test]
    fn test_truncates_each_update() {
        let mut engine = unit_engine();
        let counters = EncoderCounters::new();
        engine.reset_heading(-90.0);
        for _ in 0..3 {
            counters.record(Wheel::Left, 1);
            counters.record(Wheel::Right, 0);
            engine.update_position(-90.0, &counters);
        }
        // Each half millimeter step is lost to truncation
        assert_eq!(engine.position(), Position::default());
        assert_eq!(engine.odometer_mm(&counters), 1.5);
    }

    #[test]
    fn test_tick_interval() {
        let mut engine = unit_engine();
        let counters = EncoderCounters::new();
        assert!(engine.tick(1, 0.0, &counters).is_some());
        assert!(engine.tick(201, 0.0, &counters).is_none());
        assert!(engine.tick(202, 0.0, &counters).is_some());
    }

    #[test]
    fn test_odometer_includes_pending_pulses() {
        let engine = unit_engine();
        let counters = EncoderCounters::new();
        counters.record(Wheel::Left, 10);
        counters.record(Wheel::Right, 30);
        assert_eq!(engine.odometer_mm(&counters), 20.0);
        assert_eq!(counters.peek(), (10, 30));
    }

    #[test]
    fn test_reset() {
        let mut engine = unit_engine();
        let counters = EncoderCounters::new();
        counters.record(Wheel::Left, 100);
        counters.record(Wheel::Right, 100);
        engine.update_position(0.0, &counters);
        engine.reset();
        assert_eq!(engine.position(), Position::default());
    }
}
