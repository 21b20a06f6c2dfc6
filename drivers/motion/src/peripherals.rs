//!
//! Interfaces to the hardware the motion code drives and samples
//!

/// The pair of wheel drivers.
///
/// Targets are signed pwm values in `-MAX_PWM..=MAX_PWM` in each board's own
/// orientation, so a forward drive has the left target negative.
pub trait Drivetrain {
    /// Set the target pwm for the left and right wheel
    fn set_target_pwm(&mut self, left: i16, right: i16);

    /// Run one service step of the wheel driver (ramp toward the targets, push them out)
    fn service(&mut self);

    /// The pwm each wheel is currently being driven at
    fn current_pwm(&self) -> (i16, i16);
}

/// Gyro backed heading.
pub trait HeadingSource {
    /// The current heading in degrees, in the range (-180, 180]
    fn heading(&mut self) -> f32;

    /// Let the source sample its sensor.  Called once per control loop tick.
    fn service(&mut self) {}
}

/// Source of the board temperature reported over the serial link
pub trait TemperatureSource {
    /// Temperature in whole degrees celsius
    fn temperature(&mut self) -> i32;
}
