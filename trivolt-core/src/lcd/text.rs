//! Text output at the cursor

use embedded_hal::delay::DelayNs;
use trivolt_hal::TwiController;

use super::{Lcd, LcdError};

impl<C: TwiController, D: DelayNs> Lcd<C, D> {
    /// Write `text` at the cursor, one transaction per character
    ///
    /// Output ends at the end of `text` or at an embedded NUL. Stops at
    /// the first transfer error.
    pub fn print(&mut self, text: &str) -> Result<(), LcdError> {
        for &byte in text.as_bytes().iter().take_while(|&&b| b != 0) {
            self.write_char(byte)?;
        }
        Ok(())
    }

    /// Write a NUL-terminated string at the cursor
    ///
    /// Fails with [`LcdError::OutOfSpace`] before sending anything when
    /// `text` holds no NUL.
    pub fn print_cstr(&mut self, text: &[u8]) -> Result<(), LcdError> {
        let end = text
            .iter()
            .position(|&b| b == 0)
            .ok_or(LcdError::OutOfSpace)?;

        for &byte in &text[..end] {
            self.write_char(byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::DisplayConfig;
    use crate::lcd::{Lcd, LcdError};
    use crate::test_support::RecordingDelay;
    use crate::twi::{Phase, TwiError, TwiMaster};
    use trivolt_hal::sim::{BusEvent, SimController, SimDevice};
    use trivolt_hal::TwiConfig;

    const LCD: u8 = 0x3E;

    fn lcd(sim: SimController) -> Lcd<SimController, RecordingDelay> {
        let bus = TwiMaster::new(sim, TwiConfig::STANDARD.timing(16_000_000));
        Lcd::new(bus, RecordingDelay::default(), &DisplayConfig::default())
    }

    fn selects(sim: &SimController) -> std::vec::Vec<u8> {
        sim.events()
            .windows(2)
            .filter_map(|pair| match pair {
                [BusEvent::Address(_), BusEvent::Write(select)] => Some(*select),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_one_transaction_per_character() {
        let mut lcd = lcd(SimController::new().with_device(SimDevice::new(LCD)));

        lcd.print("Q1:-").unwrap();

        let sim = lcd.sequencer().bus().controller();
        assert_eq!(sim.count(|e| matches!(e, BusEvent::Start { .. })), 4);
        assert_eq!(sim.count(|e| *e == BusEvent::Stop), 4);
        assert_eq!(selects(sim), [0x40, 0x40, 0x40, 0x40]);
        assert_eq!(
            sim.device(LCD).unwrap().received(),
            &[0x40, b'Q', 0x40, b'1', 0x40, b':', 0x40, b'-']
        );
    }

    #[test]
    fn test_print_stops_at_nul() {
        let mut lcd = lcd(SimController::new().with_device(SimDevice::new(LCD)));

        lcd.print("ab\0cd").unwrap();

        let sim = lcd.sequencer().bus().controller();
        assert_eq!(sim.device(LCD).unwrap().received(), &[0x40, b'a', 0x40, b'b']);
    }

    #[test]
    fn test_print_cstr_bounded_by_terminator() {
        let mut lcd = lcd(SimController::new().with_device(SimDevice::new(LCD)));

        lcd.print_cstr(b"12.34\0\xAA\xAA").unwrap();

        let sim = lcd.sequencer().bus().controller();
        assert_eq!(sim.count(|e| matches!(e, BusEvent::Start { .. })), 5);
    }

    #[test]
    fn test_print_cstr_without_terminator() {
        let mut lcd = lcd(SimController::new().with_device(SimDevice::new(LCD)));

        assert_eq!(lcd.print_cstr(b"12.34"), Err(LcdError::OutOfSpace));
        assert!(lcd.sequencer().bus().controller().events().is_empty());
    }

    #[test]
    fn test_empty_text_sends_nothing() {
        let mut lcd = lcd(SimController::new().with_device(SimDevice::new(LCD)));

        lcd.print("").unwrap();
        lcd.print_cstr(b"\0").unwrap();

        assert!(lcd.sequencer().bus().controller().events().is_empty());
    }

    #[test]
    fn test_print_stops_at_first_error() {
        let mut lcd = lcd(SimController::new());

        let result = lcd.print("V:");

        assert_eq!(result, Err(LcdError::Bus(TwiError::Nack(Phase::Address))));
        let sim = lcd.sequencer().bus().controller();
        assert_eq!(sim.count(|e| matches!(e, BusEvent::Start { .. })), 1);
    }
}
