//! Fixed-count averaging

use embedded_hal::delay::DelayNs;
use trivolt_hal::{AdcError, AnalogInput};

/// Sums a fixed number of readings and yields their integer mean
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AveragingFilter {
    count: u16,
    taken: u16,
    sum: u32,
}

impl AveragingFilter {
    /// Filter averaging `count` readings (at least one)
    pub fn new(count: u16) -> Self {
        Self {
            count: count.max(1),
            taken: 0,
            sum: 0,
        }
    }

    /// Readings per mean
    pub fn count(&self) -> u16 {
        self.count
    }

    /// Readings taken toward the next mean
    pub fn pending(&self) -> u16 {
        self.taken
    }

    /// Add a reading; returns the mean once `count` readings are in
    ///
    /// The filter starts over after returning a mean.
    pub fn push(&mut self, reading: u16) -> Option<u16> {
        self.sum += reading as u32;
        self.taken += 1;

        if self.taken < self.count {
            return None;
        }

        let mean = (self.sum / self.count as u32) as u16;
        self.reset();
        Some(mean)
    }

    /// Drop readings taken so far
    pub fn reset(&mut self) {
        self.taken = 0;
        self.sum = 0;
    }
}

/// Read `channel` until `filter` produces a mean
///
/// Waits `interval_us` after every conversion. Readings left in the filter
/// from an earlier call are discarded first.
pub fn sample_channel<A, D>(
    input: &mut A,
    channel: u8,
    filter: &mut AveragingFilter,
    interval_us: u32,
    delay: &mut D,
) -> Result<u16, AdcError>
where
    A: AnalogInput,
    D: DelayNs,
{
    filter.reset();
    loop {
        let reading = input.read(channel)?;
        delay.delay_us(interval_us);
        if let Some(mean) = filter.push(reading) {
            return Ok(mean);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeAdc, RecordingDelay};

    #[test]
    fn test_mean_after_count() {
        let mut filter = AveragingFilter::new(4);
        assert_eq!(filter.push(10), None);
        assert_eq!(filter.push(20), None);
        assert_eq!(filter.push(30), None);
        assert_eq!(filter.push(40), Some(25));
        assert_eq!(filter.pending(), 0);
    }

    #[test]
    fn test_mean_truncates() {
        let mut filter = AveragingFilter::new(3);
        filter.push(1);
        filter.push(1);
        assert_eq!(filter.push(2), Some(1));
    }

    #[test]
    fn test_zero_count_means_single_reading() {
        let mut filter = AveragingFilter::new(0);
        assert_eq!(filter.count(), 1);
        assert_eq!(filter.push(512), Some(512));
    }

    #[test]
    fn test_no_overflow_at_full_scale() {
        let mut filter = AveragingFilter::new(1024);
        let mut mean = None;
        for _ in 0..1024 {
            mean = filter.push(u16::MAX);
        }
        assert_eq!(mean, Some(u16::MAX));
    }

    #[test]
    fn test_sample_channel_reference_timing() {
        let mut adc = FakeAdc::new(1024).with_script(2, &[100, 110]);
        let mut delay = RecordingDelay::default();
        let mut filter = AveragingFilter::new(10);

        let mean = sample_channel(&mut adc, 2, &mut filter, 200, &mut delay).unwrap();

        assert_eq!(mean, 105);
        assert_eq!(adc.reads, 10);
        assert_eq!(delay.total_us(), 10 * 200);
    }

    #[test]
    fn test_sample_channel_discards_stale_readings() {
        let mut adc = FakeAdc::new(1024).with_level(0, 8);
        let mut delay = RecordingDelay::default();
        let mut filter = AveragingFilter::new(2);
        filter.push(1000);

        let mean = sample_channel(&mut adc, 0, &mut filter, 0, &mut delay).unwrap();

        assert_eq!(mean, 8);
        assert_eq!(adc.reads, 2);
    }

    #[test]
    fn test_sample_channel_propagates_adc_error() {
        let mut adc = FakeAdc::new(1024);
        let mut delay = RecordingDelay::default();
        let mut filter = AveragingFilter::new(10);

        assert_eq!(
            sample_channel(&mut adc, 1, &mut filter, 200, &mut delay),
            Err(AdcError::Conversion)
        );
        assert_eq!(
            sample_channel(&mut adc, 7, &mut filter, 200, &mut delay),
            Err(AdcError::InvalidChannel)
        );
    }
}
