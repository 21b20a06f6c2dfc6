//!
//! Line oriented serial link to the remote controller
//!

use core::fmt::{self, Write as _};

use common::{Reply, LINE_ENDING};
use embedded_hal::serial::{Read, Write};

/// Longest inbound line (terminator excluded) that will be buffered
pub const LINE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError<R, W> {
    /// The uart reported an error while reading
    Read(R),
    /// The uart reported an error while writing
    Write(W),
}

/// The error a [`SerialLink`] over `S` reports
pub type SerialLinkError<S> = LinkError<<S as Read<u8>>::Error, <S as Write<u8>>::Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// What a read of the currently available bytes produced
pub enum ReadOutcome<'a> {
    /// Nothing was waiting
    NoData,
    /// Bytes arrived but did not form a usable line (no terminator, overflow, not utf-8)
    Garbled,
    /// A complete line without its terminator
    Line(&'a str),
}

pub struct SerialLink<S> {
    serial: S,
    buffer: [u8; LINE_CAPACITY],
}

impl<S> SerialLink<S>
where
    S: Read<u8> + Write<u8>,
{
    pub fn new(serial: S) -> Self {
        Self {
            serial,
            buffer: [0u8; LINE_CAPACITY],
        }
    }

    pub fn serial(&self) -> &S {
        &self.serial
    }

    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    /// Read the bytes that are already waiting, stopping at the first `\n`.
    ///
    /// Never waits for more bytes to arrive.  A line that is still incomplete when the uart
    /// runs dry is dropped.
    pub fn read_available(&mut self) -> Result<ReadOutcome<'_>, SerialLinkError<S>> {
        let mut len = 0;
        let mut overflowed = false;

        loop {
            let byte = match self.serial.read() {
                Ok(byte) => byte,
                Err(nb::Error::WouldBlock) if len == 0 && !overflowed => {
                    return Ok(ReadOutcome::NoData)
                }
                Err(nb::Error::WouldBlock) => {
                    log::debug!("Dropping {} bytes without a line terminator", len);
                    return Ok(ReadOutcome::Garbled);
                }
                Err(nb::Error::Other(err)) => return Err(LinkError::Read(err)),
            };

            if byte == b'\n' {
                break;
            }

            if len == LINE_CAPACITY {
                if !overflowed {
                    log::warn!("Inbound line longer than {} bytes", LINE_CAPACITY);
                }
                overflowed = true;
                continue;
            }

            self.buffer[len] = byte;
            len += 1;
        }

        // An empty line has its terminator at index 0 and counts as no terminator at all
        if overflowed || len == 0 {
            return Ok(ReadOutcome::Garbled);
        }

        match core::str::from_utf8(&self.buffer[..len]) {
            Ok(line) => Ok(ReadOutcome::Line(line)),
            Err(_) => Ok(ReadOutcome::Garbled),
        }
    }

    /// Write one reply followed by the line ending
    pub fn send(&mut self, reply: &Reply) -> Result<(), SerialLinkError<S>> {
        let mut writer = LineWriter {
            serial: &mut self.serial,
            error: None,
        };

        let written = write!(writer, "{}{}", reply, LINE_ENDING);
        if let Some(err) = writer.error {
            return Err(LinkError::Write(err));
        }
        // Formatting a reply cannot fail on its own; any failure came from the uart
        debug_assert!(written.is_ok());

        nb::block!(self.serial.flush()).map_err(LinkError::Write)
    }
}

/// Adapts the uart to `core::fmt::Write`, keeping the first uart error
struct LineWriter<'a, S, E> {
    serial: &'a mut S,
    error: Option<E>,
}

impl<'a, S: Write<u8, Error = E>, E> fmt::Write for LineWriter<'a, S, E> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            if let Err(err) = nb::block!(self.serial.write(byte)) {
                self.error = Some(err);
                return Err(fmt::Error);
            }
        }
        Ok(())
    }
}
