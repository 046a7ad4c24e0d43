//! Two-wire bus master
//!
//! Drives a [`TwiController`](trivolt_hal::TwiController) through the
//! start / address / data / stop sequence and turns controller status
//! codes into [`TwiError`]s.

pub mod error;
pub mod master;

pub use error::{Phase, TwiError};
pub use master::{BusState, RetryPolicy, Timeout, TwiMaster};

/// Transfer direction, encoded in bit 0 of the address byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Master transmits
    Write = 0,
    /// Master receives
    Read = 1,
}

/// 7-bit device address plus direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Address {
    address: u8,
    direction: Direction,
}

impl Address {
    /// Address `address` (7-bit, upper bit ignored) in `direction`
    pub const fn new(address: u8, direction: Direction) -> Self {
        Self {
            address: address & 0x7F,
            direction,
        }
    }

    /// Write access to `address`
    pub const fn write(address: u8) -> Self {
        Self::new(address, Direction::Write)
    }

    /// Read access to `address`
    pub const fn read(address: u8) -> Self {
        Self::new(address, Direction::Read)
    }

    /// The byte sent right after the start condition
    pub const fn byte(&self) -> u8 {
        (self.address << 1) | self.direction as u8
    }

    /// 7-bit address
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Transfer direction
    pub const fn direction(&self) -> Direction {
        self.direction
    }
}
