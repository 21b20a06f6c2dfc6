//!
//! Command protocol: when to read the link, what a read means, and what goes back out.
//!
//! Every recognised command is answered with `<command>!`.  Lines that are not recognised get
//! no answer at all; the remote side treats silence as a rejection.  A run of polls with
//! nothing to read trips the watchdog, which the robot answers by stopping (the operating
//! state is left alone).
//!

use core::fmt::Debug;

use common::{Command, Reply};
use embedded_hal::serial::{Read, Write};
use motion::motion_control_clock::elapsed_ms;

use crate::{
    clock::{MAX_MISSED_POLLS, SERIAL_POLL_INTERVAL_MS, TICKS_BETWEEN_TEMPERATURE_REPORTS},
    serial::{ReadOutcome, SerialLink},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Minimum milliseconds between reads of the link
    pub poll_interval_ms: u32,
    /// Consecutive empty polls that trip the watchdog
    pub max_missed_polls: u32,
    /// Control loop ticks between temperature reports
    pub temperature_interval_ticks: u32,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: SERIAL_POLL_INTERVAL_MS,
            max_missed_polls: MAX_MISSED_POLLS,
            temperature_interval_ticks: TICKS_BETWEEN_TEMPERATURE_REPORTS,
        }
    }
}

pub struct CommandProtocol<S> {
    link: SerialLink<S>,
    config: ProtocolConfig,
    last_poll_ms: u32,
    missed_polls: u32,
    watchdog_tripped: bool,
    ticks_since_temperature: u32,
}

impl<S> CommandProtocol<S>
where
    S: Read<u8> + Write<u8>,
    <S as Read<u8>>::Error: Debug,
    <S as Write<u8>>::Error: Debug,
{
    pub fn new(serial: S, config: ProtocolConfig) -> Self {
        Self {
            link: SerialLink::new(serial),
            config,
            last_poll_ms: 0,
            missed_polls: 0,
            watchdog_tripped: false,
            ticks_since_temperature: 0,
        }
    }

    pub fn link(&self) -> &SerialLink<S> {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut SerialLink<S> {
        &mut self.link
    }

    pub fn missed_polls(&self) -> u32 {
        self.missed_polls
    }

    /// Read the link if the poll interval has passed.
    ///
    /// Returns the command received, [`Command::Error`] when bytes arrived that did not make
    /// up a recognised line, or `None` when it was not time to poll or nothing was waiting.
    pub fn poll(&mut self, now_ms: u32) -> Option<Command> {
        if elapsed_ms(now_ms, self.last_poll_ms) <= self.config.poll_interval_ms {
            return None;
        }
        self.last_poll_ms = now_ms;

        match self.link.read_available() {
            Ok(ReadOutcome::NoData) => {
                self.missed_polls = self.missed_polls.saturating_add(1);
                None
            }
            Ok(ReadOutcome::Garbled) => {
                self.missed_polls = 0;
                Some(Command::Error)
            }
            Ok(ReadOutcome::Line(line)) => {
                self.missed_polls = 0;
                let command = Command::parse(line);
                if command == Command::Error {
                    log::debug!("Unrecognised command {:?}", line);
                }
                Some(command)
            }
            Err(err) => {
                log::warn!("Serial read failed: {:?}", err);
                self.missed_polls = 0;
                Some(Command::Error)
            }
        }
    }

    /// Whether enough polls in a row came up empty that the robot should stop
    pub fn check_watchdog(&mut self) -> bool {
        let tripped = self.missed_polls >= self.config.max_missed_polls;
        if tripped && !self.watchdog_tripped {
            log::warn!("No commands for {} polls, stopping", self.missed_polls);
        } else if !tripped && self.watchdog_tripped {
            log::info!("Link back");
        }
        self.watchdog_tripped = tripped;
        tripped
    }

    /// Count a control loop tick, returning true when a temperature report is due
    pub fn temperature_due(&mut self) -> bool {
        self.ticks_since_temperature += 1;
        if self.ticks_since_temperature >= self.config.temperature_interval_ticks {
            self.ticks_since_temperature = 0;
            true
        } else {
            false
        }
    }

    /// Acknowledge a command.  Unrecognised commands are not answered.
    pub fn acknowledge(&mut self, command: Command) {
        if !command.is_acknowledged() {
            log::debug!("Not acknowledging {:?}", command);
            return;
        }
        if let Some(token) = command.token() {
            self.send(&Reply::Ack(token));
        }
    }

    /// Answer `text` as not understood
    pub fn reject(&mut self, text: &str) {
        self.send(&Reply::Nok(text));
    }

    /// Send a line, logging and dropping transport failures
    pub fn send(&mut self, reply: &Reply) {
        if let Err(err) = self.link.send(reply) {
            log::warn!("Failed to send {:?}: {:?}", reply, err);
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::serial::tests::FakeSerial;

    fn protocol() -> CommandProtocol<FakeSerial> {
        CommandProtocol::new(
            FakeSerial::default(),
            ProtocolConfig {
                poll_interval_ms: 10,
                max_missed_polls: 3,
                temperature_interval_ticks: 4,
            },
        )
    }

    #[test]
    fn test_poll_interval() {
        let mut protocol = protocol();
        protocol.link_mut().serial_mut().push("w\n");
        assert_eq!(protocol.poll(10), None);
        assert_eq!(protocol.missed_polls(), 0);
        assert_eq!(protocol.poll(11), Some(Command::ManualForward));
        protocol.link_mut().serial_mut().push("s\n");
        assert_eq!(protocol.poll(21), None);
        assert_eq!(protocol.poll(22), Some(Command::ManualBackward));
    }

    #[test]
    fn test_unknown_and_garbled_reset_missed_polls() {
        let mut protocol = protocol();
        assert_eq!(protocol.poll(11), None);
        assert_eq!(protocol.missed_polls(), 1);

        protocol.link_mut().serial_mut().push("zzz\n");
        assert_eq!(protocol.poll(22), Some(Command::Error));
        assert_eq!(protocol.missed_polls(), 0);

        assert_eq!(protocol.poll(33), None);
        protocol.link_mut().serial_mut().push("w");
        assert_eq!(protocol.poll(44), Some(Command::Error));
        assert_eq!(protocol.missed_polls(), 0);
    }

    #[test]
    fn test_watchdog() {
        let mut protocol = protocol();
        for now in [11, 22] {
            protocol.poll(now);
            assert!(!protocol.check_watchdog());
        }
        protocol.poll(33);
        assert!(protocol.check_watchdog());

        protocol.link_mut().serial_mut().push("hello\n");
        protocol.poll(44);
        assert!(!protocol.check_watchdog());
    }

    #[test]
    fn test_temperature_cadence() {
        let mut protocol = protocol();
        let due: std::vec::Vec<bool> = (0..8).map(|_| protocol.temperature_due()).collect();
        assert_eq!(due, [false, false, false, true, false, false, false, true]);
    }

    #[test]
    fn test_acknowledge() {
        let mut protocol = protocol();
        protocol.acknowledge(Command::Hello);
        protocol.acknowledge(Command::Error);
        protocol.acknowledge(Command::Standby);
        assert_eq!(protocol.link().serial().lines(), ["hello!", "r!"]);
    }

    #[test]
    fn test_reject() {
        let mut protocol = protocol();
        protocol.reject("zzz");
        assert_eq!(protocol.link().serial().lines(), ["zzz?"]);
    }

    #[test]
    fn test_send_swallows_errors() {
        let mut protocol = protocol();
        protocol.link_mut().serial_mut().fail_writes = true;
        protocol.send(&Reply::Temperature(20));
        assert!(protocol.link().serial().outbound.is_empty());
    }
}
