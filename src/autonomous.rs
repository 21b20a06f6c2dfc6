//!
//! Built in routines: fixed sequences of maneuvers used to check calibration on the floor
//!

use motion::{Direction, Drivetrain, Maneuver, MotionController, Progress, Snapshot};

use crate::clock::ROUTINE_PAUSE_MS;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Drive forward a distance in millimeters
    Drive { distance_mm: f32 },
    /// Rotate in place
    Rotate { degrees: i32, direction: Direction },
    /// Hold the motors stopped
    Pause { ms: i32 },
    /// Fold the latest odometry into the position and report it
    ReportPosition,
}

const LEG: Step = Step::Drive { distance_mm: 500.0 };
const PAUSE: Step = Step::Pause { ms: ROUTINE_PAUSE_MS };
const REPORT: Step = Step::ReportPosition;
const LEFT_90: Step = Step::Rotate {
    degrees: 90,
    direction: Direction::Left,
};
const RIGHT_90: Step = Step::Rotate {
    degrees: 90,
    direction: Direction::Right,
};
const RIGHT_180: Step = Step::Rotate {
    degrees: 180,
    direction: Direction::Right,
};

/// A square driven counterclockwise, an about face, then the same square clockwise
#[rustfmt::skip]
pub const SQUARE_TEST: &[Step] = &[
    LEG, REPORT, PAUSE, LEFT_90, PAUSE,
    LEG, REPORT, PAUSE, LEFT_90, PAUSE,
    LEG, REPORT, PAUSE, LEFT_90, PAUSE,
    LEG, REPORT, PAUSE, RIGHT_180, PAUSE,
    LEG, REPORT, PAUSE, RIGHT_90, PAUSE,
    LEG, REPORT, PAUSE, RIGHT_90, PAUSE,
    LEG, REPORT, PAUSE, RIGHT_90, PAUSE,
    LEG, REPORT, PAUSE,
];

/// Rotations of increasing size in alternating directions
pub const ROTATION_TEST: &[Step] = &[
    LEFT_90,
    PAUSE,
    RIGHT_180,
    PAUSE,
    Step::Rotate {
        degrees: 270,
        direction: Direction::Right,
    },
    PAUSE,
    Step::Rotate {
        degrees: 360,
        direction: Direction::Left,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineStatus {
    Running,
    /// The robot should update and report its position before the next step
    ReportPosition,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Routine {
    steps: &'static [Step],
    index: usize,
    current: Option<Maneuver>,
    speed: f32,
}

impl Routine {
    /// Run `steps` with every drive and rotation at `speed` pwm
    pub fn new(steps: &'static [Step], speed: f32) -> Self {
        Self {
            steps,
            index: 0,
            current: None,
            speed,
        }
    }

    /// Index of the step being run
    pub fn index(&self) -> usize {
        self.index
    }

    fn start(&self, step: Step) -> Option<Maneuver> {
        match step {
            Step::Drive { distance_mm } => Some(Maneuver::drive_distance(
                distance_mm,
                Direction::Forward,
                self.speed,
            )),
            Step::Rotate { degrees, direction } => {
                match Maneuver::rotate(degrees, direction, self.speed) {
                    Ok(maneuver) => Some(maneuver),
                    Err(err) => {
                        log::warn!("Skipping step {}: {:?}", self.index, err);
                        None
                    }
                }
            }
            Step::Pause { ms } => Some(Maneuver::stop_for(ms)),
            Step::ReportPosition => None,
        }
    }

    /// Advance the routine by one control loop tick
    pub fn step<D: Drivetrain>(
        &mut self,
        snapshot: &Snapshot,
        controller: &mut MotionController,
        drivetrain: &mut D,
    ) -> RoutineStatus {
        loop {
            let Some(step) = self.steps.get(self.index).copied() else {
                return RoutineStatus::Finished;
            };

            if self.current.is_none() {
                if step == Step::ReportPosition {
                    self.index += 1;
                    return RoutineStatus::ReportPosition;
                }
                match self.start(step) {
                    Some(maneuver) => {
                        log::debug!("Routine step {}: {:?}", self.index, step);
                        self.current = Some(maneuver);
                    }
                    None => {
                        self.index += 1;
                        continue;
                    }
                }
            }

            if let Some(maneuver) = &mut self.current {
                if maneuver.step(snapshot, controller, drivetrain) == Progress::Done {
                    self.current = None;
                    self.index += 1;
                }
            }
            return RoutineStatus::Running;
        }
    }
}
