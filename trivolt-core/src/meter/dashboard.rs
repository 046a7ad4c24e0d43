//! Screen layout
//!
//! Each display row holds the channels configured for it, in order, as
//! `label value ' '`. With the default configuration:
//!
//! ```text
//! row 0: Q1:-4.21
//! row 1: Q2:-11.99 V:0.00
//! ```

use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use heapless::String;
use trivolt_hal::TwiController;

use super::Readings;
use crate::config::MeterConfig;
use crate::format::{self, FixedPoint, FormatError, MAX_RENDERED_LEN};
use crate::lcd::command::{LINE_CAPACITY, ROWS};
use crate::lcd::{Lcd, LcdError};

/// Text of one display row
pub type RowText = String<{ LINE_CAPACITY as usize }>;

/// Lays channel readings out on the display
pub struct Dashboard<'a> {
    config: &'a MeterConfig,
}

impl<'a> Dashboard<'a> {
    /// Layout for the channels in `config`
    pub fn new(config: &'a MeterConfig) -> Self {
        Self { config }
    }

    /// Redraw every row that has channels on it
    ///
    /// `readings` pairs with the configured channels by position; channels
    /// without a reading are skipped.
    pub fn render<C, D>(&self, lcd: &mut Lcd<C, D>, readings: &Readings) -> Result<(), LcdError>
    where
        C: TwiController,
        D: DelayNs,
    {
        let mut buf = [0u8; MAX_RENDERED_LEN + 1];

        for row in 0..ROWS {
            if self.config.channels_on_row(row).next().is_none() {
                continue;
            }
            lcd.set_cursor(row, 0)?;

            for (channel, &value) in self.config.channels.iter().zip(readings.iter()) {
                if channel.row != row {
                    continue;
                }
                lcd.print(&channel.label)?;
                format::format_with(value, channel.digits, self.config.fraction_mode, &mut buf)?;
                lcd.print_cstr(&buf)?;
                lcd.print(" ")?;
            }
        }
        Ok(())
    }

    /// Text [`render`](Self::render) puts on `row`
    pub fn row_text(&self, row: u8, readings: &Readings) -> Result<RowText, FormatError> {
        let mut text = RowText::new();

        for (channel, &value) in self.config.channels.iter().zip(readings.iter()) {
            if channel.row != row {
                continue;
            }
            let value = FixedPoint::from_f64(value, channel.digits, self.config.fraction_mode)?;
            write!(text, "{}{} ", channel.label, value).map_err(|_| FormatError::BufferTooSmall)?;
        }
        Ok(text)
    }
}
