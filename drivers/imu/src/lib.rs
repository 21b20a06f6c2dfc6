//!
//! Driver for the ICM42605 IMU, trimmed to what a ground robot needs: the yaw rate and the die
//! temperature.
//!
//! [Datasheet](https://invensense.tdk.com/wp-content/uploads/2020/09/DS-000292-ICM-42605-v1.5.pdf)
//!

#![no_std]

use embedded_hal::blocking::{delay::DelayMs, i2c};
use registers::{Bank, BANK_SELECT, WHO_AM_I};

pub mod heading;
pub use heading::HeadingTracker;

pub mod registers;

const ICM_ADDR: u8 = 0b1101000;
const WHO_AM_I_EXPECTED: u8 = 0x42;
/// Attempts at reading the expected WHO_AM_I before giving up
const WHO_AM_I_ATTEMPTS: u8 = 10;

const LSB_TO_DPS: f32 = 1000.0 / 32768.0;
const LSB_PER_DEGREE_C: f32 = 132.48;
const TEMPERATURE_OFFSET_C: f32 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImuError<E> {
    /// The I2C bus returned an error
    Bus(E),
    /// Something answered at the IMU's address but it is not an ICM42605
    UnexpectedWhoAmI(u8),
}

/// Yaw rate in degrees per second from the two data registers
#[inline]
pub fn reading_to_dps(high: u8, low: u8) -> f32 {
    let value = i16::from_be_bytes([high, low]);
    (value as f32) * LSB_TO_DPS
}

/// Die temperature in degrees celsius from the two data registers
#[inline]
pub fn reading_to_celsius(high: u8, low: u8) -> f32 {
    let value = i16::from_be_bytes([high, low]);
    (value as f32) / LSB_PER_DEGREE_C + TEMPERATURE_OFFSET_C
}

pub struct IMU<I2C> {
    i2c: I2C,
    current_bank: Bank,
}

impl<I2C: i2c::Write<Error = E> + i2c::Read<Error = E>, E> IMU<I2C> {
    pub fn new(i2c: I2C, delay: &mut impl DelayMs<u8>) -> Result<Self, ImuError<E>> {
        let mut this = Self {
            i2c,
            current_bank: Default::default(),
        };

        log::info!("Checking whoami.");
        this.wait_for_whoami(delay)?;

        log::info!("Resetting.");
        this.write(
            registers::DeviceConfig::BANK,
            registers::DeviceConfig::ADDR,
            registers::DeviceConfig::SOFT_RESET_CONFIG.bits()
                | registers::DeviceConfig::SPI_MODE_0_AND_3.bits(),
        )
        .map_err(ImuError::Bus)?;
        // A soft reset puts the device back on bank 0
        this.current_bank = Bank::Bank0;

        delay.delay_ms(10);
        this.wait_for_whoami(delay)?;
        delay.delay_ms(100);

        log::info!("Turn on gyro.");
        // Leaving TEMP_DISABLE clear keeps the temperature sensor on
        this.write(
            registers::PowerManagement::BANK,
            registers::PowerManagement::ADDR,
            registers::PowerManagement::GYRO_LOW_NOISE.bits()
                | registers::PowerManagement::ACCEL_OFF.bits(),
        )
        .map_err(ImuError::Bus)?;

        // From 14.36:
        // Gyroscope needs to be kept ON for a minimum of 45ms. When transitioning from OFF to any
        // of the other modes, do not issue any register writes for 200μs.
        delay.delay_ms(100);

        log::info!("Configuring gyro.");
        this.write(
            registers::GyroConfig::BANK,
            registers::GyroConfig::ADDR,
            registers::GyroConfig::GYRO_FS_1000.bits()
                | registers::GyroConfig::GYRO_ODR_1kHz.bits(),
        )
        .map_err(ImuError::Bus)?;

        Ok(this)
    }

    /// A second handle on a device that another handle already brought up with [`IMU::new`].
    /// Used to share the sensor across a bus manager.
    pub fn attach(i2c: I2C) -> Self {
        Self {
            i2c,
            current_bank: Bank::Bank0,
        }
    }

    fn wait_for_whoami(&mut self, delay: &mut impl DelayMs<u8>) -> Result<(), ImuError<E>> {
        let mut last = 0;
        for _ in 0..WHO_AM_I_ATTEMPTS {
            last = self.read(Bank::Bank0, WHO_AM_I).map_err(ImuError::Bus)?;
            if last == WHO_AM_I_EXPECTED {
                return Ok(());
            }
            log::warn!("Whoami was {:#x}, expected {:#x}.", last, WHO_AM_I_EXPECTED);
            delay.delay_ms(100);
        }
        Err(ImuError::UnexpectedWhoAmI(last))
    }

    /// Yaw rate in degrees per second, counterclockwise positive
    pub fn gyro_z(&mut self) -> Result<f32, E> {
        let hi = self.read(Bank::Bank0, registers::GYRO_DATA_Z1)?;
        let lo = self.read(Bank::Bank0, registers::GYRO_DATA_Z0)?;

        Ok(reading_to_dps(hi, lo))
    }

    /// Die temperature in degrees celsius
    pub fn temperature(&mut self) -> Result<f32, E> {
        let hi = self.read(Bank::Bank0, registers::TEMP_DATA1)?;
        let lo = self.read(Bank::Bank0, registers::TEMP_DATA0)?;

        Ok(reading_to_celsius(hi, lo))
    }

    fn raw_write(&mut self, register_addr: u8, data: u8) -> Result<(), E> {
        self.i2c.write(ICM_ADDR, &[register_addr, data])
    }

    fn switch_bank(&mut self, new_bank: Bank) -> Result<(), E> {
        self.raw_write(BANK_SELECT, new_bank.value())?;
        self.current_bank = new_bank;
        Ok(())
    }

    fn read(&mut self, bank: Bank, address: u8) -> Result<u8, E> {
        if bank != self.current_bank {
            self.switch_bank(bank)?;
        }
        self.i2c.write(ICM_ADDR, &[address])?;

        let mut buf = [0];
        self.i2c.read(ICM_ADDR, &mut buf)?;

        Ok(buf[0])
    }

    fn write(&mut self, bank: Bank, address: u8, value: u8) -> Result<(), E> {
        if bank != self.current_bank {
            self.switch_bank(bank)?;
        }

        self.raw_write(address, value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;

    /// Register file behind a fake I2C bus
    struct FakeBus {
        registers: [u8; 256],
        pointer: u8,
        writes: Vec<(u8, u8)>,
    }

    impl FakeBus {
        fn new(whoami: u8) -> Self {
            let mut registers = [0u8; 256];
            registers[WHO_AM_I as usize] = whoami;
            Self {
                registers,
                pointer: 0,
                writes: Vec::new(),
            }
        }
    }

    impl i2c::Write for FakeBus {
        type Error = ();

        fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), ()> {
            assert_eq!(address, ICM_ADDR);
            match bytes {
                [register] => self.pointer = *register,
                [register, value] => self.writes.push((*register, *value)),
                _ => return Err(()),
            }
            Ok(())
        }
    }

    impl i2c::Read for FakeBus {
        type Error = ();

        fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), ()> {
            assert_eq!(address, ICM_ADDR);
            buffer[0] = self.registers[self.pointer as usize];
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayMs<u8> for NoDelay {
        fn delay_ms(&mut self, _ms: u8) {}
    }

    #[test]
    fn test_reading_to_dps() {
        assert_eq!(reading_to_dps(0x00, 0x00), 0.0);
        assert_eq!(reading_to_dps(0x40, 0x00), 500.0);
        assert_eq!(reading_to_dps(0xC0, 0x00), -500.0);
    }

    #[test]
    fn test_reading_to_celsius() {
        assert_eq!(reading_to_celsius(0x00, 0x00), 25.0);
        let raw = (132.48f32 * 10.0) as i16;
        let [hi, lo] = raw.to_be_bytes();
        let celsius = reading_to_celsius(hi, lo);
        assert!(celsius > 34.99 && celsius < 35.01);
    }

    #[test]
    fn test_init_configures_gyro() {
        let imu = IMU::new(FakeBus::new(WHO_AM_I_EXPECTED), &mut NoDelay).unwrap();
        let writes = &imu.i2c.writes;
        assert_eq!(writes[0], (registers::DeviceConfig::ADDR, 0b1));
        assert_eq!(
            writes[1],
            (registers::PowerManagement::ADDR, registers::PowerManagement::GYRO_LOW_NOISE.bits()),
        );
        assert_eq!(writes[2], (registers::GyroConfig::ADDR, 0b0010_0110));
    }

    #[test]
    fn test_init_rejects_wrong_device() {
        let result = IMU::new(FakeBus::new(0x47), &mut NoDelay);
        assert!(matches!(result, Err(ImuError::UnexpectedWhoAmI(0x47))));
    }

    #[test]
    fn test_gyro_and_temperature() {
        let mut imu = IMU::new(FakeBus::new(WHO_AM_I_EXPECTED), &mut NoDelay).unwrap();
        imu.i2c.registers[registers::GYRO_DATA_Z1 as usize] = 0x20;
        imu.i2c.registers[registers::GYRO_DATA_Z0 as usize] = 0x00;
        imu.i2c.registers[registers::TEMP_DATA1 as usize] = 0x00;
        imu.i2c.registers[registers::TEMP_DATA0 as usize] = 0x00;

        assert_eq!(imu.gyro_z().unwrap(), 250.0);
        assert_eq!(imu.temperature().unwrap(), 25.0);
    }

    #[test]
    fn test_attach_reads_without_configuring() {
        let mut bus = FakeBus::new(WHO_AM_I_EXPECTED);
        bus.registers[registers::GYRO_DATA_Z1 as usize] = 0xE0;
        let mut imu = IMU::attach(bus);
        assert_eq!(imu.gyro_z().unwrap(), -250.0);
        assert!(imu.i2c.writes.is_empty());
    }
}
