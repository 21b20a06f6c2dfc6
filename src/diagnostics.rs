//!
//! Drive self test.
//!
//! Each direction is driven for a second and then held stopped for a second.  At the end of
//! each half the wheel boards must report the pwm the controller asked for and the controller
//! must still be in the expected direction.  Any direction that misbehaves is reported by its
//! fault code.
//!

use common::Reply;
use motion::{Direction, Drivetrain, Maneuver, MotionController, Progress, Snapshot};

use crate::clock::MOVE_TEST_PHASE_MS;

/// Directions exercised by the self test, with the fault code reported when each fails
pub const MOVE_TEST_DIRECTIONS: [(Direction, u8); 4] = [
    (Direction::Forward, 1),
    (Direction::Backward, 2),
    (Direction::Left, 3),
    (Direction::Right, 4),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveTest {
    speed: f32,
    phase_ms: u32,
    // Even phases drive, odd phases hold the brakes
    phase: usize,
    current: Option<Maneuver>,
    faults: [u8; MOVE_TEST_DIRECTIONS.len()],
    fault_count: usize,
}

impl MoveTest {
    pub fn new(speed: f32) -> Self {
        Self::with_phase_ms(speed, MOVE_TEST_PHASE_MS)
    }

    pub fn with_phase_ms(speed: f32, phase_ms: u32) -> Self {
        Self {
            speed,
            phase_ms,
            phase: 0,
            current: None,
            faults: [0; MOVE_TEST_DIRECTIONS.len()],
            fault_count: 0,
        }
    }

    /// Fault codes recorded so far
    pub fn faults(&self) -> &[u8] {
        &self.faults[..self.fault_count]
    }

    /// The result line for the test so far
    pub fn report(&self) -> Reply<'_> {
        Reply::Diagnostics(self.faults())
    }

    fn record(&mut self, code: u8) {
        if self.faults().contains(&code) {
            return;
        }
        log::warn!("Move test fault {}", code);
        self.faults[self.fault_count] = code;
        self.fault_count += 1;
    }

    fn check<D: Drivetrain>(
        &mut self,
        direction: Direction,
        code: u8,
        driving: bool,
        controller: &MotionController,
        drivetrain: &D,
    ) {
        let (expected_pwm, expected_direction) = if driving {
            (controller.wheel_targets(direction, self.speed), direction)
        } else {
            ((0, 0), Direction::None)
        };

        let actual = drivetrain.current_pwm();
        if actual != expected_pwm || controller.direction() != expected_direction {
            log::debug!(
                "{:?}: expected {:?} {:?}, got {:?} {:?}",
                direction,
                expected_pwm,
                expected_direction,
                actual,
                controller.direction()
            );
            self.record(code);
        }
    }

    /// Advance the test by one control loop tick
    pub fn step<D: Drivetrain>(
        &mut self,
        snapshot: &Snapshot,
        controller: &mut MotionController,
        drivetrain: &mut D,
    ) -> Progress {
        let Some(&(direction, code)) = MOVE_TEST_DIRECTIONS.get(self.phase / 2) else {
            return Progress::Done;
        };
        let driving = self.phase % 2 == 0;
        let (speed, phase_ms) = (self.speed, self.phase_ms);

        let maneuver = self.current.get_or_insert_with(|| {
            if driving {
                Maneuver::drive_time(phase_ms, direction, speed)
            } else {
                Maneuver::stop_for(phase_ms as i32)
            }
        });

        if maneuver.step(snapshot, controller, drivetrain) == Progress::InProgress {
            return Progress::InProgress;
        }

        self.current = None;
        self.check(direction, code, driving, controller, drivetrain);
        self.phase += 1;

        if self.phase / 2 >= MOVE_TEST_DIRECTIONS.len() {
            Progress::Done
        } else {
            Progress::InProgress
        }
    }
}
