//!
//! Wheel encoder bookkeeping
//!
//! Pulses are counted from interrupt context and consumed by the control loop, so both
//! wheel counts live in a single atomic word.  A read-and-reset always sees a left/right
//! pair from the same instant.
//!
//! Counts are forward positive for each wheel.  Whoever feeds the counters is responsible
//! for flipping the sign of a wheel that is mounted mirrored.
//!
//! Quadrature decoding (pin a is the edge pin):
//!
//!	new	new	old	old
//!	b	a	b	a	Result
//!	----	----	----	----	------
//!	0	0	0	0	no movement
//!	0	0	0	1	+1
//!	0	0	1	0	-1
//!	0	0	1	1	+2  (assume pin a edges only)
//!	0	1	0	0	-1
//!	0	1	0	1	no movement
//!	0	1	1	0	-2  (assume pin a edges only)
//!	0	1	1	1	+1
//!	1	0	0	0	+1
//!	1	0	0	1	-2  (assume pin a edges only)
//!	1	0	1	0	no movement
//!	1	0	1	1	-1
//!	1	1	0	0	+2  (assume pin a edges only)
//!	1	1	0	1	-1
//!	1	1	1	0	+1
//!	1	1	1	1	no movement
//!

use portable_atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wheel {
    Left,
    Right,
}

#[inline]
fn pack(left: i32, right: i32) -> u64 {
    ((left as u32 as u64) << 32) | (right as u32 as u64)
}

#[inline]
fn unpack(packed: u64) -> (i32, i32) {
    ((packed >> 32) as u32 as i32, packed as u32 as i32)
}

/// Pulse counts for both wheels since the last reset
pub struct EncoderCounters {
    packed: AtomicU64,
}

impl EncoderCounters {
    pub const fn new() -> Self {
        Self {
            packed: AtomicU64::new(0),
        }
    }

    /// Add `delta` pulses to one wheel.  Safe to call from an interrupt.
    pub fn record(&self, wheel: Wheel, delta: i32) {
        if delta == 0 {
            return;
        }

        // The closure never returns None so this cannot fail
        let _ = self
            .packed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |packed| {
                let (left, right) = unpack(packed);
                Some(match wheel {
                    Wheel::Left => pack(left.wrapping_add(delta), right),
                    Wheel::Right => pack(left, right.wrapping_add(delta)),
                })
            });
    }

    /// The current (left, right) counts without resetting them
    pub fn peek(&self) -> (i32, i32) {
        unpack(self.packed.load(Ordering::Acquire))
    }

    /// The current (left, right) counts, resetting both to zero in the same operation
    pub fn take(&self) -> (i32, i32) {
        unpack(self.packed.swap(0, Ordering::AcqRel))
    }

    /// Zero both counters
    pub fn reset(&self) {
        self.packed.store(0, Ordering::Release);
    }
}

impl Default for EncoderCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Average pulses of the two wheels
#[inline]
pub fn average_pulses((left, right): (i32, i32)) -> f32 {
    (left as f32 + right as f32) * 0.5
}

/// Turns pin levels of a two channel encoder into pulse deltas
pub struct QuadratureDecoder {
    last_a: bool,
    last_b: bool,
}

impl QuadratureDecoder {
    /// Create a decoder from the current pin levels
    pub fn new(a: bool, b: bool) -> Self {
        Self {
            last_a: a,
            last_b: b,
        }
    }

    /// Feed the latest pin levels, returning the pulses moved since the last update
    pub fn update(&mut self, a: bool, b: bool) -> i32 {
        let delta = match (b, a, self.last_b, self.last_a) {
            (false, false, false, false)
            | (false, true, false, true)
            | (true, false, true, false)
            | (true, true, true, true) => 0,
            (false, false, false, true)
            | (false, true, true, true)
            | (true, false, false, false)
            | (true, true, true, false) => 1,
            (false, false, true, true) | (true, true, false, false) => 2,
            (false, true, true, false) | (true, false, false, true) => -2,
            (false, false, true, false)
            | (false, true, false, false)
            | (true, false, true, true)
            | (true, true, false, true) => -1,
        };

        self.last_a = a;
        self.last_b = b;

        delta
    }
}
