//!
//! Direction + speed to differential wheel targets
//!

use nalgebra::base::Vector2;

use crate::{Direction, Drivetrain, MAX_PWM};

/// The left motor runs hotter than the right, so its target is scaled down by this much
pub const MOTOR_DEVIATION_FACTOR: f32 = 0.95;
/// The wheel driver swallows this much pwm around zero before a wheel starts to turn
pub const PWM_DEAD_BAND_OFFSET: i16 = 2;
/// Distance (mm) the robot keeps rolling after the motors are cut
pub const FREE_ROLLING_MM: f32 = 20.0;
/// Degrees the robot keeps spinning after a left rotation is cut
pub const LEFT_MOMENTUM_OFFSET_DEG: i32 = 5;
/// Degrees the robot keeps spinning after a right rotation is cut
pub const RIGHT_MOMENTUM_OFFSET_DEG: i32 = 5;
/// How long the brakes are held at the end of a rotation
pub const ROTATION_SETTLE_MS: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
/// Calibration for the drivetrain
pub struct MotionConfig {
    pub motor_deviation_factor: f32,
    pub pwm_dead_band_offset: i16,
    pub free_rolling_mm: f32,
    pub left_momentum_offset_deg: i32,
    pub right_momentum_offset_deg: i32,
    pub rotation_settle_ms: u32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            motor_deviation_factor: MOTOR_DEVIATION_FACTOR,
            pwm_dead_band_offset: PWM_DEAD_BAND_OFFSET,
            free_rolling_mm: FREE_ROLLING_MM,
            left_momentum_offset_deg: LEFT_MOMENTUM_OFFSET_DEG,
            right_momentum_offset_deg: RIGHT_MOMENTUM_OFFSET_DEG,
            rotation_settle_ms: ROTATION_SETTLE_MS,
        }
    }
}

/// Number of whole revolutions contained in a rotation of `degrees`
pub fn full_circles_needed(degrees: i32) -> u32 {
    degrees.unsigned_abs() / 360
}

/// Owns the current drive direction and the wheel targets derived from it
pub struct MotionController {
    config: MotionConfig,
    direction: Direction,
    // (left, right) pwm last handed to the drivetrain
    targets: Vector2<i16>,
}

impl MotionController {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            direction: Direction::None,
            targets: Vector2::zeros(),
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Force the direction without touching the wheels.  The next drive call
    /// applies it.
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// The (left, right) pwm last handed to the drivetrain
    pub fn targets(&self) -> (i16, i16) {
        (self.targets.x, self.targets.y)
    }

    /// The (left, right) pwm `drive` produces for a direction and speed.
    pub fn wheel_targets(&self, direction: Direction, speed: f32) -> (i16, i16) {
        let (left_sign, right_sign) = direction.wheel_signs();
        let scale = Vector2::new(self.config.motor_deviation_factor, 1.0);
        let raw = Vector2::new(left_sign, right_sign).component_mul(&scale) * speed;
        let pwm = raw.map(|v| self.compensate(v as i16));
        (pwm.x, pwm.y)
    }

    /// Push a non zero target out past the driver's dead band and keep it in range
    fn compensate(&self, pwm: i16) -> i16 {
        let offset = self.config.pwm_dead_band_offset;
        let shifted = match pwm {
            0 => 0,
            p if p > 0 => p.saturating_add(offset),
            p => p.saturating_sub(offset),
        };
        shifted.clamp(-MAX_PWM, MAX_PWM)
    }

    /// Drive in `direction` at `speed` (pwm, 0..=255) and run one drivetrain service step
    pub fn drive<D: Drivetrain>(&mut self, direction: Direction, speed: f32, drivetrain: &mut D) {
        let (left, right) = self.wheel_targets(direction, speed);
        self.direction = direction;
        self.apply(left, right, drivetrain);
    }

    /// Drive each wheel at its own raw pwm.  The direction is left as it was.
    pub fn drive_separate<D: Drivetrain>(&mut self, left: i16, right: i16, drivetrain: &mut D) {
        let left = self.compensate(left);
        let right = self.compensate(right);
        self.apply(left, right, drivetrain);
    }

    pub fn stop_motors<D: Drivetrain>(&mut self, drivetrain: &mut D) {
        self.drive(Direction::None, 0.0, drivetrain);
    }

    fn apply<D: Drivetrain>(&mut self, left: i16, right: i16, drivetrain: &mut D) {
        if self.targets.x != left || self.targets.y != right {
            log::trace!(
                "Wheel targets ({}, {}) -> ({}, {})",
                self.targets.x,
                self.targets.y,
                left,
                right
            );
        }
        self.targets = Vector2::new(left, right);
        drivetrain.set_target_pwm(left, right);
        drivetrain.service();
    }
}

impl Default for MotionController {
    fn default() -> Self {
        Self::new(MotionConfig::default())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;

    /// Drivetrain that records everything it is told
    #[derive(Default)]
    pub(crate) struct FakeDrivetrain {
        pub targets: (i16, i16),
        pub services: usize,
        pub history: Vec<(i16, i16)>,
    }

    impl Drivetrain for FakeDrivetrain {
        fn set_target_pwm(&mut self, left: i16, right: i16) {
            self.targets = (left, right);
            self.history.push((left, right));
        }

        fn service(&mut self) {
            self.services += 1;
        }

        fn current_pwm(&self) -> (i16, i16) {
            self.targets
        }
    }

    fn uncompensated() -> MotionController {
        MotionController::new(MotionConfig {
            pwm_dead_band_offset: 0,
            ..Default::default()
        })
    }

    #[test]
    fn test_forward_signs() {
        let mut controller = uncompensated();
        let mut drivetrain = FakeDrivetrain::default();
        controller.drive(Direction::Forward, 200.0, &mut drivetrain);
        assert_eq!(drivetrain.targets, (-190, 200));
        assert_eq!(controller.direction(), Direction::Forward);
        assert_eq!(drivetrain.services, 1);
    }

    #[test]
    fn test_every_direction_sign() {
        let mut controller = uncompensated();
        let mut drivetrain = FakeDrivetrain::default();

        let table = [
            (Direction::Forward, (-95, 100)),
            (Direction::Backward, (95, -100)),
            (Direction::Left, (-95, -100)),
            (Direction::Right, (95, 100)),
        ];

        for (direction, expected) in table {
            controller.drive(direction, 100.0, &mut drivetrain);
            assert_eq!(drivetrain.targets, expected);
            assert_eq!(controller.targets(), expected);
        }
    }

    #[test]
    fn test_none_is_always_zero() {
        let mut controller = MotionController::default();
        let mut drivetrain = FakeDrivetrain::default();
        for speed in [0.0, 1.0, 255.0, -30.0] {
            controller.drive(Direction::None, speed, &mut drivetrain);
            assert_eq!(drivetrain.targets, (0, 0));
        }
    }

    #[test]
    fn test_dead_band_offset_and_clamp() {
        let mut controller = MotionController::default();
        let mut drivetrain = FakeDrivetrain::default();

        controller.drive(Direction::Forward, 100.0, &mut drivetrain);
        assert_eq!(drivetrain.targets, (-97, 102));

        controller.drive(Direction::Right, 255.0, &mut drivetrain);
        assert_eq!(drivetrain.targets, (244, 255));
    }

    #[test]
    fn test_drive_separate_keeps_direction() {
        let mut controller = MotionController::default();
        let mut drivetrain = FakeDrivetrain::default();
        controller.drive(Direction::Left, 50.0, &mut drivetrain);
        controller.drive_separate(-40, 0, &mut drivetrain);
        assert_eq!(drivetrain.targets, (-42, 0));
        assert_eq!(controller.direction(), Direction::Left);
    }

    #[test]
    fn test_stop_motors() {
        let mut controller = MotionController::default();
        let mut drivetrain = FakeDrivetrain::default();
        controller.drive(Direction::Backward, 120.0, &mut drivetrain);
        controller.stop_motors(&mut drivetrain);
        assert_eq!(drivetrain.targets, (0, 0));
        assert_eq!(controller.direction(), Direction::None);
    }

    #[test]
    fn test_full_circles_needed() {
        assert_eq!(full_circles_needed(0), 0);
        assert_eq!(full_circles_needed(359), 0);
        assert_eq!(full_circles_needed(360), 1);
        assert_eq!(full_circles_needed(719), 1);
        assert_eq!(full_circles_needed(-725), 2);
    }
}
