//!
//! Bounded maneuvers as step functions.
//!
//! A maneuver never blocks.  The control loop calls [`Maneuver::step`] once per tick with a
//! fresh [`Snapshot`] of the sensors, the maneuver issues at most one drive call and reports
//! whether it has finished.  Serial polling and localization keep running in between.
//!
//! Every maneuver latches its starting point (time, heading or odometer) on the first step,
//! not when it is constructed.
//!

use libm::fabsf;

use crate::{
    motion_control::full_circles_needed, motion_control_clock::elapsed_ms, Direction,
    Drivetrain, MotionController, MotionError, Turn,
};

/// Sensor readings for one control loop tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub now_ms: u32,
    /// Heading in degrees, (-180, 180]
    pub heading: f32,
    /// Signed distance driven since boot (mm)
    pub odometer_mm: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    InProgress,
    Done,
}

/// Drive until a fixed amount of time has passed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveTime {
    duration_ms: u32,
    direction: Direction,
    speed: f32,
    started: Option<u32>,
}

impl DriveTime {
    pub fn new(duration_ms: u32, direction: Direction, speed: f32) -> Self {
        Self {
            duration_ms,
            direction,
            speed,
            started: None,
        }
    }

    fn step<D: Drivetrain>(
        &mut self,
        snapshot: &Snapshot,
        controller: &mut MotionController,
        drivetrain: &mut D,
    ) -> Progress {
        let start = *self.started.get_or_insert(snapshot.now_ms);
        if elapsed_ms(snapshot.now_ms, start) >= self.duration_ms {
            return Progress::Done;
        }

        controller.drive(self.direction, self.speed, drivetrain);
        Progress::InProgress
    }
}

/// Hold the motors stopped for a fixed amount of time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopFor {
    duration_ms: u32,
    started: Option<u32>,
}

impl StopFor {
    /// Negative durations are treated as zero
    pub fn new(duration_ms: i32) -> Self {
        Self {
            duration_ms: duration_ms.max(0) as u32,
            started: None,
        }
    }

    fn step<D: Drivetrain>(
        &mut self,
        snapshot: &Snapshot,
        controller: &mut MotionController,
        drivetrain: &mut D,
    ) -> Progress {
        let start = *self.started.get_or_insert(snapshot.now_ms);
        if elapsed_ms(snapshot.now_ms, start) >= self.duration_ms {
            return Progress::Done;
        }

        controller.stop_motors(drivetrain);
        Progress::InProgress
    }
}

/// Drive until the odometer has moved a distance, less what the robot will coast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveDistance {
    distance_mm: f32,
    direction: Direction,
    speed: f32,
    start_odometer: Option<f32>,
}

impl DriveDistance {
    pub fn new(distance_mm: f32, direction: Direction, speed: f32) -> Self {
        Self {
            distance_mm,
            direction,
            speed,
            start_odometer: None,
        }
    }

    fn step<D: Drivetrain>(
        &mut self,
        snapshot: &Snapshot,
        controller: &mut MotionController,
        drivetrain: &mut D,
    ) -> Progress {
        let start = *self.start_odometer.get_or_insert(snapshot.odometer_mm);
        let travelled = fabsf(snapshot.odometer_mm - start);
        if travelled >= self.distance_mm - controller.config().free_rolling_mm {
            return Progress::Done;
        }

        controller.drive(self.direction, self.speed, drivetrain);
        Progress::InProgress
    }
}

/// Spin a whole number of revolutions, counted by watching the heading pass through
/// all four quadrants and come back around to where it started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FullCircles {
    remaining: u32,
    turn: Turn,
    speed: f32,
    start: Option<i32>,
    // (0, -90], (-90, -180), (90, 180], (0, 90]
    quadrants: [bool; 4],
    closing: bool,
}

impl FullCircles {
    pub fn new(circles: u32, turn: Turn, speed: f32) -> Self {
        Self {
            remaining: circles,
            turn,
            speed,
            start: None,
            quadrants: [false; 4],
            closing: false,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    fn latch(&mut self, heading: i32) {
        if heading <= 0 && heading > -90 {
            self.quadrants[0] = true;
        } else if heading <= -90 && heading > -180 {
            self.quadrants[1] = true;
        } else if heading <= 180 && heading > 90 {
            self.quadrants[2] = true;
        } else if heading <= 90 && heading > 0 {
            self.quadrants[3] = true;
        }
    }

    fn step<D: Drivetrain>(
        &mut self,
        snapshot: &Snapshot,
        controller: &mut MotionController,
        drivetrain: &mut D,
    ) -> Progress {
        if self.remaining == 0 {
            return Progress::Done;
        }

        let direction = Direction::from(self.turn);
        let heading = snapshot.heading as i32;
        let start = *self.start.get_or_insert(heading);

        if !self.closing {
            self.latch(heading);
            if !self.quadrants.iter().all(|seen| *seen) {
                controller.drive(direction, self.speed, drivetrain);
                return Progress::InProgress;
            }
            log::debug!("All quadrants seen, closing revolution at {}", start);
            self.closing = true;
        }

        let short_of_start = match self.turn {
            Turn::Left => snapshot.heading > start as f32,
            Turn::Right => snapshot.heading < start as f32,
        };

        controller.drive(direction, self.speed, drivetrain);
        if short_of_start {
            return Progress::InProgress;
        }

        self.remaining -= 1;
        self.start = None;
        self.quadrants = [false; 4];
        self.closing = false;
        log::debug!("Revolution complete, {} left", self.remaining);

        if self.remaining == 0 {
            Progress::Done
        } else {
            Progress::InProgress
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RotatePhase {
    /// Working through the whole revolutions first
    Circles(FullCircles),
    /// Pick the heading to stop at
    Aim,
    /// The stop heading is reachable without crossing the +-180 seam
    Direct { target: i32 },
    /// The stop heading is on the far side of the seam
    Wrapped { target: i32, near: bool, crossed: bool },
    /// Brake before reporting done
    Settle(StopFor),
}

/// Rotate in place by a number of degrees using the gyro heading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotate {
    degrees: i32,
    turn: Turn,
    speed: f32,
    phase: RotatePhase,
}

impl Rotate {
    pub fn new(degrees: i32, turn: Turn, speed: f32) -> Self {
        Self {
            degrees,
            turn,
            speed,
            phase: RotatePhase::Circles(FullCircles::new(
                full_circles_needed(degrees),
                turn,
                speed,
            )),
        }
    }

    fn aim(&self, heading: f32, controller: &MotionController) -> RotatePhase {
        let config = controller.config();
        match self.turn {
            Turn::Left => {
                let offset = (self.degrees - config.left_momentum_offset_deg) % 360;
                let target = (heading - offset as f32) as i32;
                if target >= -180 {
                    RotatePhase::Direct { target }
                } else {
                    let delta = target.abs() % 180;
                    RotatePhase::Wrapped {
                        target: 180 - delta,
                        near: false,
                        crossed: false,
                    }
                }
            }
            Turn::Right => {
                let offset = (self.degrees - config.right_momentum_offset_deg) % 360;
                let target = (heading + offset as f32) as i32;
                if target <= 180 {
                    RotatePhase::Direct { target }
                } else {
                    let delta = target.abs() % 180;
                    RotatePhase::Wrapped {
                        target: -(180 - delta),
                        near: false,
                        crossed: false,
                    }
                }
            }
        }
    }

    /// Whether the heading still has to move toward `target`
    fn short_of(&self, heading: f32, target: i32) -> bool {
        match self.turn {
            Turn::Left => heading > target as f32,
            Turn::Right => heading < target as f32,
        }
    }

    fn settle(controller: &MotionController) -> RotatePhase {
        RotatePhase::Settle(StopFor::new(controller.config().rotation_settle_ms as i32))
    }

    fn step<D: Drivetrain>(
        &mut self,
        snapshot: &Snapshot,
        controller: &mut MotionController,
        drivetrain: &mut D,
    ) -> Progress {
        let direction = Direction::from(self.turn);

        loop {
            match &mut self.phase {
                RotatePhase::Circles(circles) => {
                    if circles.step(snapshot, controller, drivetrain) == Progress::InProgress {
                        return Progress::InProgress;
                    }
                    self.phase = RotatePhase::Aim;
                }
                RotatePhase::Aim => {
                    self.phase = self.aim(snapshot.heading, controller);
                    log::debug!("Rotation phase {:?}", self.phase);
                }
                RotatePhase::Direct { target } => {
                    let target = *target;
                    if self.short_of(snapshot.heading, target) {
                        controller.drive(direction, self.speed, drivetrain);
                        return Progress::InProgress;
                    }
                    self.phase = Self::settle(controller);
                }
                RotatePhase::Wrapped {
                    target,
                    near,
                    crossed,
                } => {
                    let heading = snapshot.heading as i32;
                    if !*crossed {
                        let (in_near_half, past_peak) = match self.turn {
                            Turn::Left => (heading >= -180 && heading < 90, heading > 90),
                            Turn::Right => (heading > 0 && heading <= 180, heading < -90),
                        };
                        if in_near_half {
                            *near = true;
                        }
                        if *near && past_peak {
                            log::debug!("Rotation crossed the seam");
                            *crossed = true;
                        } else {
                            controller.drive(direction, self.speed, drivetrain);
                            return Progress::InProgress;
                        }
                    }

                    let target = *target;
                    if self.short_of(snapshot.heading, target) {
                        controller.drive(direction, self.speed, drivetrain);
                        return Progress::InProgress;
                    }
                    self.phase = Self::settle(controller);
                }
                RotatePhase::Settle(stop) => {
                    return stop.step(snapshot, controller, drivetrain);
                }
            }
        }
    }
}

/// A single bounded movement
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Maneuver {
    DriveTime(DriveTime),
    DriveDistance(DriveDistance),
    FullCircles(FullCircles),
    Rotate(Rotate),
    StopFor(StopFor),
}

impl Maneuver {
    pub fn drive_time(duration_ms: u32, direction: Direction, speed: f32) -> Self {
        Self::DriveTime(DriveTime::new(duration_ms, direction, speed))
    }

    pub fn drive_distance(distance_mm: f32, direction: Direction, speed: f32) -> Self {
        Self::DriveDistance(DriveDistance::new(distance_mm, direction, speed))
    }

    /// Whole revolutions only.  `direction` must be left or right.
    pub fn full_circles(
        circles: u32,
        direction: Direction,
        speed: f32,
    ) -> Result<Self, MotionError> {
        let turn = Turn::try_from(direction)?;
        Ok(Self::FullCircles(FullCircles::new(circles, turn, speed)))
    }

    /// Rotate by `degrees` (whole revolutions included).  `direction` must be left or right.
    pub fn rotate(degrees: i32, direction: Direction, speed: f32) -> Result<Self, MotionError> {
        let turn = Turn::try_from(direction)?;
        Ok(Self::Rotate(Rotate::new(degrees, turn, speed)))
    }

    pub fn stop_for(duration_ms: i32) -> Self {
        Self::StopFor(StopFor::new(duration_ms))
    }

    /// Advance the maneuver by one control loop tick
    pub fn step<D: Drivetrain>(
        &mut self,
        snapshot: &Snapshot,
        controller: &mut MotionController,
        drivetrain: &mut D,
    ) -> Progress {
        match self {
            Self::DriveTime(m) => m.step(snapshot, controller, drivetrain),
            Self::DriveDistance(m) => m.step(snapshot, controller, drivetrain),
            Self::FullCircles(m) => m.step(snapshot, controller, drivetrain),
            Self::Rotate(m) => m.step(snapshot, controller, drivetrain),
            Self::StopFor(m) => m.step(snapshot, controller, drivetrain),
        }
    }
}
