//! GPIO pin abstractions
//!
//! Two-wire buses never drive a line high: a device either pulls the line
//! low or lets the external pull-up raise it. [`OpenDrainPin`] captures
//! exactly that, so a software bus controller cannot short the line.

/// Open-drain bus line
///
/// Implementations should handle the actual hardware register manipulation
/// for the specific chip, typically by switching the pin between input
/// (released) and output-low (driven).
pub trait OpenDrainPin {
    /// Stop driving the line and let the pull-up raise it
    fn release(&mut self);

    /// Actively pull the line low
    fn drive_low(&mut self);

    /// Check if the line reads high (logic 1)
    ///
    /// This reads the wire, not the output latch: a released line held
    /// low by another device reads low.
    fn is_high(&self) -> bool;

    /// Check if the line reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }

    /// Release the line for a 1, drive it for a 0
    fn set_level(&mut self, high: bool) {
        if high {
            self.release();
        } else {
            self.drive_low();
        }
    }
}
