//! Two-wire character LCD
//!
//! Drives a 16x2 text controller of the kind found on Grove RGB LCD
//! modules: 7-bit address `0x3E`, one register-select byte before every
//! instruction or character.

pub mod command;
pub mod sequencer;
mod text;

pub use command::RegisterSelect;
pub use sequencer::{Sequencer, Timing};

use embedded_hal::delay::DelayNs;
use trivolt_hal::TwiController;

use crate::config::DisplayConfig;
use crate::format::FormatError;
use crate::twi::{TwiError, TwiMaster};

/// Wait after instructions the controller needs longer for (ms)
const SLOW_INSTRUCTION_MS: u32 = 2;

/// Errors from the display layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LcdError {
    /// The bus transfer failed
    Bus(TwiError),
    /// Text buffer has no terminator
    OutOfSpace,
    /// A value could not be rendered
    Format(FormatError),
    /// Cursor position outside display memory
    InvalidPosition,
}

impl From<TwiError> for LcdError {
    fn from(e: TwiError) -> Self {
        LcdError::Bus(e)
    }
}

impl From<FormatError> for LcdError {
    fn from(e: FormatError) -> Self {
        LcdError::Format(e)
    }
}

/// Character LCD on a two-wire bus
pub struct Lcd<C, D> {
    seq: Sequencer<C, D>,
    address: u8,
    power_up_ms: u32,
}

impl<C: TwiController, D: DelayNs> Lcd<C, D> {
    /// Create a driver; nothing is sent until [`init`](Self::init)
    pub fn new(bus: TwiMaster<C>, delay: D, config: &DisplayConfig) -> Self {
        Self {
            seq: Sequencer::new(bus, delay, Timing::from(config)),
            address: config.address,
            power_up_ms: config.power_up_ms,
        }
    }

    /// Power-up sequence
    ///
    /// Waits out the controller's power-on time, enables the bus, then
    /// sends function set (polling until the controller answers), display
    /// on, clear and entry mode.
    pub fn init(&mut self) -> Result<(), LcdError> {
        self.seq.delay_ms(self.power_up_ms);
        self.seq.bus_mut().init();
        self.seq.delay_ms(SLOW_INSTRUCTION_MS);

        self.seq.send_instruction_when_ready(
            self.address,
            RegisterSelect::Command,
            command::FUNCTION_SET,
        )?;
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "lcd: {=u8:#x} answered after {=u32} retries",
            self.address,
            self.seq.bus().retries()
        );
        self.seq.delay_ms(SLOW_INSTRUCTION_MS);

        self.command(command::DISPLAY_ON)?;
        self.clear()?;
        self.command(command::ENTRY_MODE)?;
        self.seq.delay_ms(SLOW_INSTRUCTION_MS);
        Ok(())
    }

    /// Send one instruction byte
    pub fn command(&mut self, byte: u8) -> Result<(), LcdError> {
        self.seq
            .send_instruction(self.address, RegisterSelect::Command, byte)?;
        Ok(())
    }

    /// Write one character at the cursor
    pub fn write_char(&mut self, byte: u8) -> Result<(), LcdError> {
        self.seq
            .send_instruction(self.address, RegisterSelect::Data, byte)?;
        Ok(())
    }

    /// Blank the display and home the cursor
    pub fn clear(&mut self) -> Result<(), LcdError> {
        self.command(command::CLEAR)?;
        self.seq.delay_ms(SLOW_INSTRUCTION_MS);
        Ok(())
    }

    /// Move the cursor to row 0, column 0
    pub fn home(&mut self) -> Result<(), LcdError> {
        self.command(command::HOME)?;
        self.seq.delay_ms(SLOW_INSTRUCTION_MS);
        Ok(())
    }

    /// Move the cursor to `col` on `row`
    pub fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), LcdError> {
        let instruction = command::set_cursor(row, col).ok_or(LcdError::InvalidPosition)?;
        self.command(instruction)
    }

    /// 7-bit bus address of the controller
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Borrow the instruction sequencer
    pub fn sequencer(&self) -> &Sequencer<C, D> {
        &self.seq
    }

    /// Give back the bus engine and the delay
    pub fn release(self) -> (TwiMaster<C>, D) {
        self.seq.release()
    }
}
