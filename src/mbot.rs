//!
//! The robot context.
//!
//! [`MBot`] owns every piece of mutable robot state (operating state, direction, speed,
//! position, the active plan) together with the peripherals that state is applied to.
//! Each call to [`MBot::tick`] runs one pass of the control loop:
//!
//! 1. let the heading source sample the gyro
//! 2. poll the command link and dispatch whatever arrived
//! 3. enforce the communication watchdog
//! 4. send the temperature when it is due
//! 5. act on the operating state (hold the brakes, step the active plan or drive manually)
//! 6. update and report the position estimate when it is due
//!
//! Nothing in a tick blocks, so commands keep being answered while a plan is running.
//!

use core::fmt::Debug;

use common::{Command, Reply};
use embedded_hal::serial::{Read, Write};
use motion::{
    Direction, Drivetrain, EncoderCounters, HeadingSource, LocalizationEngine, MotionControlClock,
    MotionController, Position, Progress, Snapshot, TemperatureSource, MAX_PWM,
};

use crate::{
    autonomous::{Routine, RoutineStatus, ROTATION_TEST, SQUARE_TEST},
    diagnostics::MoveTest,
    protocol::CommandProtocol,
    robot::RobotConfig,
    state::{RobotState, StateMachine},
};

/// Manual speed before any speed command has been received
pub const DEFAULT_MANUAL_SPEED_PERCENT: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
/// A plan the robot is running instead of following the manual direction
pub enum Activity {
    Routine(Routine),
    MoveTest(MoveTest),
}

pub struct MBot<'a, S, D, H, T, C> {
    config: RobotConfig,
    protocol: CommandProtocol<S>,
    drivetrain: D,
    heading: H,
    temperature: T,
    clock: C,
    counters: &'a EncoderCounters,
    state: StateMachine,
    motion: MotionController,
    localization: LocalizationEngine,
    manual_speed_percent: u8,
    activity: Option<Activity>,
}

impl<'a, S, D, H, T, C> MBot<'a, S, D, H, T, C>
where
    S: Read<u8> + Write<u8>,
    <S as Read<u8>>::Error: Debug,
    <S as Write<u8>>::Error: Debug,
    D: Drivetrain,
    H: HeadingSource,
    T: TemperatureSource,
    C: MotionControlClock,
{
    pub fn new(
        config: RobotConfig,
        serial: S,
        drivetrain: D,
        heading: H,
        temperature: T,
        clock: C,
        counters: &'a EncoderCounters,
    ) -> Self {
        Self {
            protocol: CommandProtocol::new(serial, config.protocol),
            motion: MotionController::new(config.motion),
            localization: LocalizationEngine::new(config.localization),
            config,
            drivetrain,
            heading,
            temperature,
            clock,
            counters,
            state: StateMachine::new(),
            manual_speed_percent: DEFAULT_MANUAL_SPEED_PERCENT,
            activity: None,
        }
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    pub fn state(&self) -> RobotState {
        self.state.state()
    }

    pub fn direction(&self) -> Direction {
        self.motion.direction()
    }

    pub fn position(&self) -> Position {
        self.localization.position()
    }

    pub fn manual_speed_percent(&self) -> u8 {
        self.manual_speed_percent
    }

    pub fn activity(&self) -> Option<&Activity> {
        self.activity.as_ref()
    }

    pub fn protocol(&self) -> &CommandProtocol<S> {
        &self.protocol
    }

    pub fn protocol_mut(&mut self) -> &mut CommandProtocol<S> {
        &mut self.protocol
    }

    pub fn drivetrain(&self) -> &D {
        &self.drivetrain
    }

    pub fn drivetrain_mut(&mut self) -> &mut D {
        &mut self.drivetrain
    }

    /// Run one pass of the control loop
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();
        self.heading.service();

        if let Some(command) = self.protocol.poll(now) {
            self.dispatch(command);
        }

        // A running plan owns the direction, the watchdog only stops manual driving
        if self.protocol.check_watchdog() && self.activity.is_none() {
            self.motion.set_direction(Direction::None);
        }

        if self.protocol.temperature_due() {
            let temperature = self.temperature.temperature();
            self.protocol.send(&Reply::Temperature(temperature));
        }

        let heading = self.heading.heading();
        match self.state.state() {
            RobotState::Standby => self.motion.stop_motors(&mut self.drivetrain),
            RobotState::Manual => self.manual_tick(now, heading),
        }

        if let Some(position) = self.localization.tick(now, heading, self.counters) {
            self.send_position(position);
        }
    }

    /// Carry out a command and acknowledge it.  Unrecognised commands change nothing and
    /// are not answered.
    pub fn dispatch(&mut self, command: Command) {
        match command {
            Command::Hello => {}
            Command::Standby => self.enter_standby(),
            Command::ManualStop => {
                self.cancel_activity();
                self.state.enter_manual();
                self.motion.set_direction(Direction::None);
            }
            Command::ManualForward => self.set_direction(Direction::Forward),
            Command::ManualBackward => self.set_direction(Direction::Backward),
            Command::ManualLeft => self.set_direction(Direction::Left),
            Command::ManualRight => self.set_direction(Direction::Right),
            Command::SetSpeedHigh => {
                self.set_manual_speed(self.config.speeds.high);
            }
            Command::SetSpeedMedium => {
                self.set_manual_speed(self.config.speeds.medium);
            }
            Command::SetSpeedLow => {
                self.set_manual_speed(self.config.speeds.low);
            }
            Command::Error => return,
        }

        self.protocol.acknowledge(command);
    }

    /// Stop, forget any plan and start the position estimate over from the origin
    pub fn enter_standby(&mut self) {
        self.cancel_activity();
        self.state.enter_standby();
        self.motion.stop_motors(&mut self.drivetrain);
        self.counters.reset();
        self.localization.reset();
        let heading = self.heading.heading();
        self.localization.reset_heading(heading);
    }

    /// Set the manual speed percentage.  Anything above 100 is refused and the current speed
    /// is kept.
    pub fn set_manual_speed(&mut self, percent: u8) -> bool {
        if percent > 100 {
            log::warn!("Refusing manual speed of {}%", percent);
            return false;
        }

        log::debug!("Manual speed {}% -> {}%", self.manual_speed_percent, percent);
        self.manual_speed_percent = percent;
        true
    }

    /// Drive the square test at the autonomous speed
    pub fn start_square_test(&mut self) {
        let speed = self.config.percentage_to_pwm(self.config.autonomous_speed_percent);
        self.start_activity(Activity::Routine(Routine::new(SQUARE_TEST, speed)));
    }

    /// Spin through the rotation test at full power
    pub fn start_rotation_test(&mut self) {
        self.start_activity(Activity::Routine(Routine::new(ROTATION_TEST, MAX_PWM as f32)));
    }

    /// Run the drive self test at full manual speed
    pub fn start_move_test(&mut self) {
        let speed = self.config.percentage_to_pwm(DEFAULT_MANUAL_SPEED_PERCENT);
        self.start_activity(Activity::MoveTest(MoveTest::new(speed)));
    }

    /// Take over from manual driving with a plan
    pub fn start_activity(&mut self, activity: Activity) {
        log::info!("Starting {:?}", activity);
        self.state.enter_manual();
        self.motion.set_direction(Direction::None);
        self.activity = Some(activity);
    }

    fn cancel_activity(&mut self) {
        if self.activity.take().is_some() {
            log::info!("Plan cancelled");
        }
    }

    fn set_direction(&mut self, direction: Direction) {
        self.cancel_activity();
        self.motion.set_direction(direction);
    }

    fn send_position(&mut self, position: Position) {
        self.protocol.send(&Reply::Position {
            x: position.x,
            y: position.y,
        });
    }

    fn manual_tick(&mut self, now: u32, heading: f32) {
        let snapshot = Snapshot {
            now_ms: now,
            heading,
            odometer_mm: self.localization.odometer_mm(self.counters),
        };

        match &mut self.activity {
            Some(Activity::Routine(routine)) => {
                match routine.step(&snapshot, &mut self.motion, &mut self.drivetrain) {
                    RoutineStatus::Running => {}
                    RoutineStatus::ReportPosition => {
                        let position = self.localization.update_position(heading, self.counters);
                        self.send_position(position);
                    }
                    RoutineStatus::Finished => {
                        log::info!("Routine finished");
                        self.activity = None;
                        self.motion.stop_motors(&mut self.drivetrain);
                    }
                }
            }
            Some(Activity::MoveTest(test)) => {
                if test.step(&snapshot, &mut self.motion, &mut self.drivetrain) == Progress::Done {
                    let test = *test;
                    log::info!("Move test finished with faults {:?}", test.faults());
                    self.protocol.send(&test.report());
                    self.activity = None;
                }
            }
            None => {
                let speed = self.config.percentage_to_pwm(self.manual_speed_percent);
                let direction = self.motion.direction();
                self.motion.drive(direction, speed, &mut self.drivetrain);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::{cell::Cell, rc::Rc, string::String, vec::Vec};

    use motion::Wheel;

    use super::*;
    use crate::{
        drivetrain::tests::FakeDrivetrain, protocol::ProtocolConfig, serial::tests::FakeSerial,
    };

    #[derive(Clone, Default)]
    struct FakeClock(Rc<Cell<u32>>);

    impl MotionControlClock for FakeClock {
        fn now_ms(&mut self) -> u32 {
            self.0.get()
        }
    }

    #[derive(Clone, Default)]
    struct FakeHeading(Rc<Cell<f32>>);

    impl HeadingSource for FakeHeading {
        fn heading(&mut self) -> f32 {
            self.0.get()
        }
    }

    struct FixedTemperature(i32);

    impl TemperatureSource for FixedTemperature {
        fn temperature(&mut self) -> i32 {
            self.0
        }
    }

    type TestBot<'a> =
        MBot<'a, FakeSerial, FakeDrivetrain, FakeHeading, FixedTemperature, FakeClock>;

    struct Harness {
        clock: FakeClock,
        heading: FakeHeading,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                clock: FakeClock::default(),
                heading: FakeHeading::default(),
            }
        }

        fn bot<'a>(&self, counters: &'a EncoderCounters) -> TestBot<'a> {
            let config = RobotConfig {
                protocol: ProtocolConfig {
                    poll_interval_ms: 10,
                    max_missed_polls: 3,
                    temperature_interval_ticks: 5,
                },
                ..Default::default()
            };
            MBot::new(
                config,
                FakeSerial::default(),
                FakeDrivetrain::default(),
                self.heading.clone(),
                FixedTemperature(31),
                self.clock.clone(),
                counters,
            )
        }

        /// Advance past one poll interval and run a tick
        fn tick(&self, bot: &mut TestBot) {
            self.clock.0.set(self.clock.0.get() + 11);
            bot.tick();
        }

        /// Deliver one line and run the tick that reads it
        fn send(&self, bot: &mut TestBot, line: &str) {
            bot.protocol_mut().link_mut().serial_mut().push(line);
            self.tick(bot);
        }
    }

    fn lines(bot: &TestBot) -> Vec<String> {
        bot.protocol().link().serial().lines()
    }

    /// Everything sent except the periodic telemetry
    fn acks(bot: &TestBot) -> Vec<String> {
        lines(bot)
            .into_iter()
            .filter(|line| !line.starts_with("p:") && !line.starts_with("t:"))
            .collect()
    }

    #[test]
    fn test_hello() {
        let counters = EncoderCounters::new();
        let harness = Harness::new();
        let mut bot = harness.bot(&counters);
        harness.send(&mut bot, "hello\n");
        assert_eq!(acks(&bot), ["hello!"]);
        assert_eq!(bot.state(), RobotState::Standby);
    }

    #[test]
    fn test_manual_forward() {
        let counters = EncoderCounters::new();
        let harness = Harness::new();
        let mut bot = harness.bot(&counters);
        harness.send(&mut bot, "c\n");
        assert_eq!(bot.state(), RobotState::Manual);
        assert_eq!(bot.direction(), Direction::None);
        assert_eq!(bot.drivetrain().target, (0, 0));

        harness.send(&mut bot, "w\n");
        assert_eq!(bot.direction(), Direction::Forward);
        assert_eq!(bot.drivetrain().target, (-244, 255));
        assert_eq!(acks(&bot), ["c!", "w!"]);
    }

    #[test]
    fn test_unknown_command_is_ignored() {
        let counters = EncoderCounters::new();
        let harness = Harness::new();
        let mut bot = harness.bot(&counters);
        harness.send(&mut bot, "c\n");
        harness.send(&mut bot, "w\n");
        harness.send(&mut bot, "zzz\n");
        assert_eq!(acks(&bot), ["c!", "w!"]);
        assert_eq!(bot.direction(), Direction::Forward);
        assert_eq!(bot.state(), RobotState::Manual);
    }

    #[test]
    fn test_direction_ignored_in_standby() {
        let counters = EncoderCounters::new();
        let harness = Harness::new();
        let mut bot = harness.bot(&counters);
        harness.send(&mut bot, "w\n");
        assert_eq!(acks(&bot), ["w!"]);
        assert_eq!(bot.state(), RobotState::Standby);
        assert_eq!(bot.drivetrain().target, (0, 0));
        assert_eq!(bot.direction(), Direction::None);
    }

    #[test]
    fn test_watchdog_stops_without_leaving_manual() {
        let counters = EncoderCounters::new();
        let harness = Harness::new();
        let mut bot = harness.bot(&counters);
        harness.send(&mut bot, "c\n");
        harness.send(&mut bot, "w\n");

        harness.tick(&mut bot);
        harness.tick(&mut bot);
        assert_eq!(bot.direction(), Direction::Forward);

        harness.tick(&mut bot);
        assert_eq!(bot.direction(), Direction::None);
        assert_eq!(bot.drivetrain().target, (0, 0));
        assert_eq!(bot.state(), RobotState::Manual);

        // Link comes back, the robot waits for a fresh direction
        harness.send(&mut bot, "hello\n");
        assert_eq!(bot.direction(), Direction::None);
        harness.send(&mut bot, "s\n");
        assert_eq!(bot.direction(), Direction::Backward);
    }

    #[test]
    fn test_position_report_and_standby_reset() {
        let counters = EncoderCounters::new();
        let harness = Harness::new();
        let mut bot = harness.bot(&counters);
        harness.send(&mut bot, "c\n");

        // 100 pulses on each wheel at heading 0 is 56.89mm along -y
        counters.record(Wheel::Left, 100);
        counters.record(Wheel::Right, 100);
        for _ in 0..20 {
            harness.tick(&mut bot);
        }
        assert_eq!(bot.position(), Position { x: 0, y: -56 });
        assert!(lines(&bot).iter().any(|line| line == "p:0,-56"));

        counters.record(Wheel::Left, 7);
        harness.send(&mut bot, "r\n");
        assert_eq!(bot.state(), RobotState::Standby);
        assert_eq!(bot.position(), Position::default());
        assert_eq!(counters.peek(), (0, 0));

        harness.send(&mut bot, "c\n");
        assert_eq!(bot.state(), RobotState::Manual);
        assert_eq!(bot.direction(), Direction::None);
        assert_eq!(acks(&bot), ["c!", "r!", "c!"]);
    }

    #[test]
    fn test_temperature_cadence() {
        let counters = EncoderCounters::new();
        let harness = Harness::new();
        let mut bot = harness.bot(&counters);
        let temperatures = |bot: &TestBot| lines(bot).iter().filter(|line| *line == "t:31").count();

        for _ in 0..4 {
            harness.tick(&mut bot);
        }
        assert_eq!(temperatures(&bot), 0);
        harness.tick(&mut bot);
        assert_eq!(temperatures(&bot), 1);
        for _ in 0..5 {
            harness.tick(&mut bot);
        }
        assert_eq!(temperatures(&bot), 2);
    }

    #[test]
    fn test_speed_levels() {
        let counters = EncoderCounters::new();
        let harness = Harness::new();
        let mut bot = harness.bot(&counters);
        assert_eq!(bot.manual_speed_percent(), DEFAULT_MANUAL_SPEED_PERCENT);

        harness.send(&mut bot, "c\n");
        harness.send(&mut bot, "l\n");
        assert_eq!(bot.manual_speed_percent(), 30);
        harness.send(&mut bot, "w\n");
        assert_eq!(bot.drivetrain().target, (-74, 78));

        harness.send(&mut bot, "m\n");
        assert_eq!(bot.manual_speed_percent(), 60);
        harness.send(&mut bot, "h\n");
        assert_eq!(bot.manual_speed_percent(), 100);
        assert_eq!(acks(&bot), ["c!", "l!", "w!", "m!", "h!"]);
    }

    #[test]
    fn test_speed_above_full_is_refused() {
        let counters = EncoderCounters::new();
        let harness = Harness::new();
        let mut bot = harness.bot(&counters);
        assert!(bot.set_manual_speed(40));
        assert!(!bot.set_manual_speed(150));
        assert_eq!(bot.manual_speed_percent(), 40);
    }

    #[test]
    fn test_routine_runs_and_is_cancelled_by_a_direction() {
        let counters = EncoderCounters::new();
        let harness = Harness::new();
        let mut bot = harness.bot(&counters);
        bot.start_square_test();
        assert_eq!(bot.state(), RobotState::Manual);

        // Silence on the link does not stop a plan
        for _ in 0..5 {
            harness.tick(&mut bot);
        }
        assert_eq!(bot.direction(), Direction::Forward);
        assert!(bot.activity().is_some());

        harness.send(&mut bot, "a\n");
        assert!(bot.activity().is_none());
        assert_eq!(bot.direction(), Direction::Left);
        assert_eq!(acks(&bot), ["a!"]);
    }

    #[test]
    fn test_standby_cancels_routine() {
        let counters = EncoderCounters::new();
        let harness = Harness::new();
        let mut bot = harness.bot(&counters);
        bot.start_rotation_test();
        harness.tick(&mut bot);
        assert_eq!(bot.direction(), Direction::Left);

        harness.send(&mut bot, "r\n");
        assert!(bot.activity().is_none());
        assert_eq!(bot.state(), RobotState::Standby);
        assert_eq!(bot.drivetrain().target, (0, 0));
    }

    #[test]
    fn test_move_test_reports_ok() {
        let counters = EncoderCounters::new();
        let harness = Harness::new();
        let mut bot = harness.bot(&counters);
        bot.start_move_test();

        for _ in 0..1_000 {
            harness.tick(&mut bot);
            if bot.activity().is_none() {
                break;
            }
        }
        assert!(bot.activity().is_none());
        assert_eq!(acks(&bot), ["d:ok"]);
        assert_eq!(bot.state(), RobotState::Manual);
    }

    #[test]
    fn test_move_test_reports_faults() {
        let counters = EncoderCounters::new();
        let harness = Harness::new();
        let mut bot = harness.bot(&counters);
        bot.drivetrain_mut().dead_left = true;
        bot.start_move_test();

        for _ in 0..1_000 {
            harness.tick(&mut bot);
        }
        assert_eq!(acks(&bot), ["d:fail:1,2,3,4"]);
    }
}
