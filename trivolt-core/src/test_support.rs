//! Fakes shared by the unit tests

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use trivolt_hal::{AdcError, AnalogInput};

/// Delay that only adds up how long it was asked to wait
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub total_ns: u64,
}

impl RecordingDelay {
    pub fn total_us(&self) -> u64 {
        self.total_ns / 1_000
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

/// Analog input replaying a script of counts per channel
#[derive(Debug)]
pub struct FakeAdc {
    span: u16,
    scripts: [Vec<u16, 16>; 4],
    positions: [usize; 4],
    pub reads: u32,
}

impl FakeAdc {
    pub fn new(span: u16) -> Self {
        Self {
            span,
            scripts: Default::default(),
            positions: [0; 4],
            reads: 0,
        }
    }

    /// Channel returns `counts` in order, then starts over
    pub fn with_script(mut self, channel: u8, counts: &[u16]) -> Self {
        let script = &mut self.scripts[channel as usize];
        script.clear();
        let _ = script.extend_from_slice(counts);
        self
    }

    /// Channel always returns `count`
    pub fn with_level(self, channel: u8, count: u16) -> Self {
        self.with_script(channel, &[count])
    }
}

impl AnalogInput for FakeAdc {
    fn read(&mut self, channel: u8) -> Result<u16, AdcError> {
        let index = channel as usize;
        if index >= self.scripts.len() {
            return Err(AdcError::InvalidChannel);
        }
        let script = &self.scripts[index];
        if script.is_empty() {
            return Err(AdcError::Conversion);
        }

        self.reads += 1;
        let value = script[self.positions[index] % script.len()];
        self.positions[index] += 1;
        Ok(value)
    }

    fn span(&self) -> u16 {
        self.span
    }
}
