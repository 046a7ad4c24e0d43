//! Open-drain bus lines
//!
//! RP2040 pads have no true open-drain mode; `OutputOpenDrain` emulates it
//! by switching the pad between output-low and input. The bus pull-ups
//! are external, so the internal ones stay off.

use embassy_rp::gpio::{Level, OutputOpenDrain, Pin};
use embassy_rp::Peri;
use trivolt_hal::OpenDrainPin;

/// GPIO pin used as one line of a two-wire bus
pub struct OpenDrain<'d> {
    pin: OutputOpenDrain<'d>,
}

impl<'d> OpenDrain<'d> {
    /// Take `pin` as a released (high) bus line
    pub fn new(pin: Peri<'d, impl Pin>) -> Self {
        Self {
            pin: OutputOpenDrain::new(pin, Level::High),
        }
    }
}

impl OpenDrainPin for OpenDrain<'_> {
    fn release(&mut self) {
        self.pin.set_high();
    }

    fn drive_low(&mut self) {
        self.pin.set_low();
    }

    fn is_high(&self) -> bool {
        // Pad input, not the output latch
        self.pin.is_high()
    }
}
