//!
//! The IMU seen through the robot's sensor traits
//!

use core::fmt::Debug;

use embedded_hal::blocking::{delay::DelayMs, i2c};
use imu::{HeadingTracker, IMU};
use motion::{HeadingSource, TemperatureSource};

/// Heading integrated from the IMU's yaw rate, clockwise positive
pub struct GyroHeading<I2C> {
    imu: IMU<I2C>,
    tracker: HeadingTracker,
    period_s: f32,
}

impl<I2C: i2c::Write<Error = E> + i2c::Read<Error = E>, E: Debug> GyroHeading<I2C> {
    /// `period_s` is the time between calls to [`HeadingSource::service`]
    pub fn new(imu: IMU<I2C>, period_s: f32) -> Self {
        Self {
            imu,
            tracker: HeadingTracker::default(),
            period_s,
        }
    }

    /// Measure the gyro's zero rate bias.  The robot must be standing still.
    pub fn calibrate(&mut self, samples: u32, delay: &mut impl DelayMs<u8>) {
        for _ in 0..samples {
            match self.imu.gyro_z() {
                Ok(rate) => self.tracker.add_calibration_sample(-rate),
                Err(err) => log::warn!("Dropping calibration sample: {:?}", err),
            }
            delay.delay_ms(2);
        }
        self.tracker.finish_calibration();
    }
}

impl<I2C, E> HeadingSource for GyroHeading<I2C>
where
    I2C: i2c::Write<Error = E> + i2c::Read<Error = E>,
    E: Debug,
{
    fn heading(&mut self) -> f32 {
        self.tracker.heading()
    }

    fn service(&mut self) {
        // The IMU reads counterclockwise positive
        match self.imu.gyro_z() {
            Ok(rate) => {
                self.tracker.update(-rate, self.period_s);
            }
            Err(err) => log::warn!("Gyro read failed: {:?}", err),
        }
    }
}

/// The IMU's die temperature
pub struct ImuTemperature<I2C> {
    imu: IMU<I2C>,
    last: i32,
}

impl<I2C> ImuTemperature<I2C> {
    pub fn new(imu: IMU<I2C>) -> Self {
        Self { imu, last: 0 }
    }
}

impl<I2C: i2c::Write<Error = E> + i2c::Read<Error = E>, E: Debug> TemperatureSource
    for ImuTemperature<I2C>
{
    fn temperature(&mut self) -> i32 {
        match self.imu.temperature() {
            Ok(celsius) => self.last = celsius as i32,
            Err(err) => log::warn!("Temperature read failed, reporting the last value: {:?}", err),
        }
        self.last
    }
}
