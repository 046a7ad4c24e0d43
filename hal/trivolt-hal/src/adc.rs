//! Analog input abstractions

/// Errors that can occur while sampling an analog channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcError {
    /// Channel index not wired to this input
    InvalidChannel,
    /// Conversion did not complete or reported a fault
    Conversion,
}

/// Multi-channel analog input
///
/// Takes `&mut self` because a conversion reconfigures the shared
/// multiplexer.
pub trait AnalogInput {
    /// Run one conversion on `channel` and return the raw count
    fn read(&mut self, channel: u8) -> Result<u16, AdcError>;

    /// Number of distinct counts (1024 for a 10-bit converter)
    fn span(&self) -> u16;
}
