//!
//! Heading from an integrated yaw rate
//!

/// Rates below this (deg/s) after bias removal are treated as sensor noise
pub const DEFAULT_DEAD_BAND_DPS: f32 = 0.3;

/// Wrap an angle in degrees into (-180, 180]
pub fn wrap_degrees(mut degrees: f32) -> f32 {
    while degrees > 180.0 {
        degrees -= 360.0;
    }
    while degrees <= -180.0 {
        degrees += 360.0;
    }
    degrees
}

/// Integrates yaw rate samples into a heading in (-180, 180].
///
/// The zero rate bias is estimated from samples taken while the robot is known to be
/// standing still.
pub struct HeadingTracker {
    heading: f32,
    bias_dps: f32,
    dead_band_dps: f32,
    calibration_sum: f32,
    calibration_samples: u32,
}

impl HeadingTracker {
    pub fn new(dead_band_dps: f32) -> Self {
        Self {
            heading: 0.0,
            bias_dps: 0.0,
            dead_band_dps,
            calibration_sum: 0.0,
            calibration_samples: 0,
        }
    }

    /// Feed a rate sample taken while stationary
    pub fn add_calibration_sample(&mut self, rate_dps: f32) {
        self.calibration_sum += rate_dps;
        self.calibration_samples += 1;
    }

    /// Adopt the mean of the calibration samples as the bias
    pub fn finish_calibration(&mut self) -> f32 {
        if self.calibration_samples > 0 {
            self.bias_dps = self.calibration_sum / self.calibration_samples as f32;
        }
        log::info!(
            "Gyro bias {} dps from {} samples",
            self.bias_dps,
            self.calibration_samples
        );
        self.calibration_sum = 0.0;
        self.calibration_samples = 0;
        self.bias_dps
    }

    /// Integrate `rate_dps` over `dt_s` seconds, returning the new heading
    pub fn update(&mut self, rate_dps: f32, dt_s: f32) -> f32 {
        let rate = rate_dps - self.bias_dps;
        if rate > self.dead_band_dps || rate < -self.dead_band_dps {
            self.heading = wrap_degrees(self.heading + rate * dt_s);
        }
        self.heading
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }
}

impl Default for HeadingTracker {
    fn default() -> Self {
        Self::new(DEFAULT_DEAD_BAND_DPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(0.0), 0.0);
        assert_eq!(wrap_degrees(180.0), 180.0);
        assert_eq!(wrap_degrees(-180.0), 180.0);
        assert_eq!(wrap_degrees(190.0), -170.0);
        assert_eq!(wrap_degrees(-190.0), 170.0);
        assert_eq!(wrap_degrees(725.0), 5.0);
    }

    #[test]
    fn test_integrates_and_wraps() {
        let mut tracker = HeadingTracker::new(0.0);
        for _ in 0..10 {
            tracker.update(100.0, 0.25);
        }
        // 250 degrees clockwise lands at -110
        assert_eq!(tracker.heading(), -110.0);
    }

    #[test]
    fn test_bias_is_removed() {
        let mut tracker = HeadingTracker::new(0.0);
        for _ in 0..4 {
            tracker.add_calibration_sample(2.0);
        }
        assert_eq!(tracker.finish_calibration(), 2.0);
        assert_eq!(tracker.update(2.0, 1.0), 0.0);
        assert_eq!(tracker.update(12.0, 1.0), 10.0);
    }

    #[test]
    fn test_dead_band() {
        let mut tracker = HeadingTracker::default();
        assert_eq!(tracker.update(0.2, 1.0), 0.0);
        assert_eq!(tracker.update(-0.2, 1.0), 0.0);
        assert_eq!(tracker.update(1.0, 1.0), 1.0);
    }
}
