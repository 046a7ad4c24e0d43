//! ADC channel management
//!
//! RP2040 has a single 12-bit ADC with 5 channels:
//! - ADC0: GPIO26
//! - ADC1: GPIO27
//! - ADC2: GPIO28
//! - ADC3: GPIO29
//! - ADC4: Internal temperature sensor

use embassy_rp::adc::{Adc, Blocking, Channel};
use heapless::Vec;
use trivolt_hal::{AdcError, AnalogInput};

/// Counts of the 12-bit converter
pub const ADC_SPAN: u16 = 4096;

/// ADC channel identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcChannel {
    /// ADC0 on GPIO26
    Adc0,
    /// ADC1 on GPIO27
    Adc1,
    /// ADC2 on GPIO28
    Adc2,
    /// ADC3 on GPIO29
    Adc3,
    /// Internal temperature sensor
    Temperature,
}

impl AdcChannel {
    /// Get the GPIO pin for this ADC channel
    pub fn gpio(&self) -> Option<u8> {
        match self {
            AdcChannel::Adc0 => Some(26),
            AdcChannel::Adc1 => Some(27),
            AdcChannel::Adc2 => Some(28),
            AdcChannel::Adc3 => Some(29),
            AdcChannel::Temperature => None,
        }
    }

    /// Channel by multiplexer input number, as used in the meter config
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(AdcChannel::Adc0),
            1 => Some(AdcChannel::Adc1),
            2 => Some(AdcChannel::Adc2),
            3 => Some(AdcChannel::Adc3),
            4 => Some(AdcChannel::Temperature),
            _ => None,
        }
    }

    /// Multiplexer input number
    pub fn index(&self) -> u8 {
        *self as u8
    }
}

/// ADC allocator
pub struct AdcAllocator {
    allocated: [bool; 5],
}

impl Default for AdcAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl AdcAllocator {
    /// Create a new ADC allocator
    pub fn new() -> Self {
        Self {
            allocated: [false; 5],
        }
    }

    /// Allocate an ADC channel
    pub fn allocate(&mut self, channel: AdcChannel) -> Result<(), AdcError> {
        let idx = channel as usize;
        if self.allocated[idx] {
            Err(AdcError::InvalidChannel)
        } else {
            self.allocated[idx] = true;
            Ok(())
        }
    }

    /// Release an ADC channel
    pub fn release(&mut self, channel: AdcChannel) {
        self.allocated[channel as usize] = false;
    }

    /// Check if a channel is allocated
    pub fn is_allocated(&self, channel: AdcChannel) -> bool {
        self.allocated[channel as usize]
    }
}

/// Blocking ADC with a set of wired channels
///
/// Conversions busy-wait, which suits the meter loop: the sample interval
/// is a few hundred microseconds and nothing else runs meanwhile.
pub struct BlockingAdc<'d> {
    adc: Adc<'d, Blocking>,
    channels: Vec<(AdcChannel, Channel<'d>), 5>,
    allocator: AdcAllocator,
}

impl<'d> BlockingAdc<'d> {
    /// Wrap an ADC created with `Adc::new_blocking`
    pub fn new(adc: Adc<'d, Blocking>) -> Self {
        Self {
            adc,
            channels: Vec::new(),
            allocator: AdcAllocator::new(),
        }
    }

    /// Wire `input` as `channel`
    ///
    /// Fails if the channel is already wired.
    pub fn with_channel(mut self, channel: AdcChannel, input: Channel<'d>) -> Result<Self, AdcError> {
        self.allocator.allocate(channel)?;
        self.channels
            .push((channel, input))
            .map_err(|_| AdcError::InvalidChannel)?;
        Ok(self)
    }
}

impl AnalogInput for BlockingAdc<'_> {
    fn read(&mut self, channel: u8) -> Result<u16, AdcError> {
        let wanted = AdcChannel::from_index(channel).ok_or(AdcError::InvalidChannel)?;
        let (_, input) = self
            .channels
            .iter_mut()
            .find(|(wired, _)| *wired == wanted)
            .ok_or(AdcError::InvalidChannel)?;

        self.adc
            .blocking_read(input)
            .map_err(|_| AdcError::Conversion)
    }

    fn span(&self) -> u16 {
        ADC_SPAN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_numbering() {
        assert_eq!(AdcChannel::from_index(2), Some(AdcChannel::Adc2));
        assert_eq!(AdcChannel::Adc2.index(), 2);
        assert_eq!(AdcChannel::Adc2.gpio(), Some(28));
        assert_eq!(AdcChannel::from_index(5), None);
    }

    #[test]
    fn test_allocator() {
        let mut alloc = AdcAllocator::new();
        assert!(alloc.allocate(AdcChannel::Adc1).is_ok());
        assert_eq!(
            alloc.allocate(AdcChannel::Adc1),
            Err(AdcError::InvalidChannel)
        );
        alloc.release(AdcChannel::Adc1);
        assert!(!alloc.is_allocated(AdcChannel::Adc1));
    }
}
