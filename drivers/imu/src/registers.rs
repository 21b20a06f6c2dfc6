//!
//! ICM-42605 register map (only what the heading and temperature readers touch)
//!

use bitflags::bitflags;

pub const TEMP_DATA1: u8 = 0x1D;
pub const TEMP_DATA0: u8 = 0x1E;
pub const GYRO_DATA_Z1: u8 = 0x29;
pub const GYRO_DATA_Z0: u8 = 0x2A;
pub const WHO_AM_I: u8 = 0x75;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DeviceConfig: u8 {
        const SPI_MODE_0_AND_3 = 0b0 << 4;
        const SPI_MODE_1_AND_2 = 0b1 << 4;

        const SOFT_RESET_CONFIG = 0b1;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PowerManagement: u8 {
        const TEMP_DISABLE = 0b1 << 5;

        const GYRO_OFF = 0b00 << 2;
        const GYRO_STANDBY = 0b01 << 2;
        const GYRO_LOW_NOISE = 0b11 << 2;

        const ACCEL_OFF = 0b00;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GyroConfig: u8 {
        const GYRO_FS_2000 = 0b000 << 5;
        const GYRO_FS_1000 = 0b001 << 5;
        const GYRO_FS_500 = 0b010 << 5;
        const GYRO_FS_250 = 0b011 << 5;

        const GYRO_ODR_1kHz = 0b0110;
        const GYRO_ODR_200Hz = 0b0111;
        const GYRO_ODR_100Hz = 0b1000;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Bank {
    #[default]
    Bank0,
    Bank1,
    Bank2,
    Bank3,
    Bank4,
}

impl Bank {
    pub fn value(self) -> u8 {
        match self {
            Bank::Bank0 => 0,
            Bank::Bank1 => 1,
            Bank::Bank2 => 2,
            Bank::Bank3 => 3,
            Bank::Bank4 => 4,
        }
    }
}

/// Register selecting which bank the other addresses refer to
pub const BANK_SELECT: u8 = 0x76;

impl DeviceConfig {
    pub const ADDR: u8 = 0x11;
    pub const BANK: Bank = Bank::Bank0;
}

impl PowerManagement {
    pub const ADDR: u8 = 0x4E;
    pub const BANK: Bank = Bank::Bank0;
}

impl GyroConfig {
    pub const ADDR: u8 = 0x4F;
    pub const BANK: Bank = Bank::Bank0;
}
