//!
//! Millisecond time base for maneuver deadlines and the localization interval.
//!
//! The board counts in a free-running 32 bit timer, so every comparison goes through
//! [`elapsed_ms`] rather than ordering two timestamps directly.
//!

/// Monotonic millisecond clock used to schedule maneuvers and localization.
///
/// The value is allowed to wrap; consumers only ever look at differences.
pub trait MotionControlClock {
    /// Milliseconds since some fixed point in the past
    fn now_ms(&mut self) -> u32;
}

/// Milliseconds elapsed between `start` and `now`, tolerant of the counter wrapping
#[inline]
pub fn elapsed_ms(now: u32, start: u32) -> u32 {
    now.wrapping_sub(start)
}
