//! Register-select + payload transactions
//!
//! The LCD controller takes every byte as its own bus transaction:
//!
//! ```text
//! START  addr+W  (phase)  select  (phase)  payload  (phase)  STOP  (settle)
//! ```
//!
//! The waits are the controller's timing contract; it ignores bytes that
//! arrive sooner.

use embedded_hal::delay::DelayNs;
use trivolt_hal::TwiController;

use super::command::RegisterSelect;
use crate::config::DisplayConfig;
use crate::twi::{Address, TwiError, TwiMaster};

/// Waits inserted around each instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// Between the phases of one instruction (µs)
    pub phase_us: u32,
    /// After the stop, before the next instruction (µs)
    pub settle_us: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            phase_us: 20,
            settle_us: 40,
        }
    }
}

impl From<&DisplayConfig> for Timing {
    fn from(config: &DisplayConfig) -> Self {
        Self {
            phase_us: config.phase_us,
            settle_us: config.settle_us,
        }
    }
}

/// Sends single-byte instructions to a register-select device
pub struct Sequencer<C, D> {
    bus: TwiMaster<C>,
    delay: D,
    timing: Timing,
}

impl<C: TwiController, D: DelayNs> Sequencer<C, D> {
    /// Create a sequencer on an initialised bus
    pub fn new(bus: TwiMaster<C>, delay: D, timing: Timing) -> Self {
        Self { bus, delay, timing }
    }

    /// One transaction: start, register select, payload, stop
    ///
    /// Opens with [`TwiMaster::start`]; a device that does not answer is
    /// not retried. Once open, the transaction is always closed with a stop
    /// and the first error seen is returned.
    pub fn send_instruction(
        &mut self,
        address: u8,
        select: RegisterSelect,
        byte: u8,
    ) -> Result<(), TwiError> {
        self.bus.start(Address::write(address))?;
        self.finish(select, byte)
    }

    /// Like [`send_instruction`](Self::send_instruction), but polls a busy
    /// device with [`TwiMaster::start_wait`] until it acknowledges
    pub fn send_instruction_when_ready(
        &mut self,
        address: u8,
        select: RegisterSelect,
        byte: u8,
    ) -> Result<(), TwiError> {
        self.bus.start_wait(Address::write(address))?;
        self.finish(select, byte)
    }

    /// Block for `ms` milliseconds
    pub fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// Waits in use
    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Borrow the bus engine
    pub fn bus(&self) -> &TwiMaster<C> {
        &self.bus
    }

    /// Mutably borrow the bus engine
    pub fn bus_mut(&mut self) -> &mut TwiMaster<C> {
        &mut self.bus
    }

    /// Give back the bus engine and the delay
    pub fn release(self) -> (TwiMaster<C>, D) {
        (self.bus, self.delay)
    }

    fn finish(&mut self, select: RegisterSelect, byte: u8) -> Result<(), TwiError> {
        let sent = self.write_payload(select, byte);

        self.delay.delay_us(self.timing.phase_us);
        let stopped = self.bus.stop();
        self.delay.delay_us(self.timing.settle_us);

        sent.and(stopped)
    }

    fn write_payload(&mut self, select: RegisterSelect, byte: u8) -> Result<(), TwiError> {
        self.delay.delay_us(self.timing.phase_us);
        self.bus.write(select.byte())?;
        self.delay.delay_us(self.timing.phase_us);
        self.bus.write(byte)
    }
}
