//!
//! The serial link to the Raspberry Pi.
//!
//! Received bytes are drained from the uart by its interrupt into a channel so nothing is
//! lost between polls.  Writes go straight to the uart, which is shared with the interrupt
//! through a critical section.
//!

use core::{cell::RefCell, convert::Infallible};

use cortex_m::interrupt::{self, Mutex};
use embedded_hal::serial::{Read, Write};
use imxrt_hal::lpuart;
use rtic_sync::channel::{Receiver, Sender};

use crate::PiUart;

/// Bytes buffered between the uart interrupt and the control loop
pub const PI_RX_CAPACITY: usize = 64;

static PI_UART: Mutex<RefCell<Option<PiUart>>> = Mutex::new(RefCell::new(None));

/// Hand the uart over to the link.  Receive interrupts should already be enabled.
pub fn install(uart: PiUart) {
    interrupt::free(|cs| *PI_UART.borrow(cs).borrow_mut() = Some(uart));
}

/// Move every received byte into `rx`.  Called from the uart interrupt.
pub fn on_interrupt(rx: &mut Sender<'static, u8, PI_RX_CAPACITY>) {
    interrupt::free(|cs| {
        let mut uart = PI_UART.borrow(cs).borrow_mut();
        let Some(uart) = uart.as_mut() else {
            return;
        };

        while uart.status().contains(lpuart::Status::RECEIVE_FULL) {
            let byte: u8 = uart.read_data().into();
            if rx.try_send(byte).is_err() {
                log::warn!("Pi link overrun, dropping {:#x}", byte);
            }
        }
        uart.clear_status(lpuart::Status::W1C);
    });
}

pub struct PiLink {
    rx: Receiver<'static, u8, PI_RX_CAPACITY>,
}

impl PiLink {
    pub fn new(rx: Receiver<'static, u8, PI_RX_CAPACITY>) -> Self {
        Self { rx }
    }
}

impl Read<u8> for PiLink {
    type Error = Infallible;

    fn read(&mut self) -> nb::Result<u8, Infallible> {
        self.rx.try_recv().map_err(|_| nb::Error::WouldBlock)
    }
}

impl Write<u8> for PiLink {
    type Error = Infallible;

    fn write(&mut self, word: u8) -> nb::Result<(), Infallible> {
        interrupt::free(|cs| match PI_UART.borrow(cs).borrow_mut().as_mut() {
            Some(uart) => Write::write(uart, word).map_err(|_| nb::Error::WouldBlock),
            None => Err(nb::Error::WouldBlock),
        })
    }

    fn flush(&mut self) -> nb::Result<(), Infallible> {
        interrupt::free(|cs| match PI_UART.borrow(cs).borrow_mut().as_mut() {
            Some(uart) => Write::flush(uart).map_err(|_| nb::Error::WouldBlock),
            None => Ok(()),
        })
    }
}
