//! Sampling pipeline
//!
//! ```text
//! AnalogInput ─▶ AveragingFilter ─▶ ChannelScale ─▶ Dashboard ─▶ Lcd
//!   (counts)        (mean)            (volts)        (text)
//! ```

pub mod dashboard;
pub mod filter;
pub mod scale;

pub use dashboard::{Dashboard, RowText};
pub use filter::{sample_channel, AveragingFilter};
pub use scale::ChannelScale;

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use trivolt_hal::{AdcError, AnalogInput};

use crate::config::{MeterConfig, MAX_CHANNELS};

/// One reading per configured channel, in volts
pub type Readings = Vec<f64, MAX_CHANNELS>;

/// Sample and scale every configured channel, in order
pub fn read_channels<A, D>(
    input: &mut A,
    config: &MeterConfig,
    delay: &mut D,
) -> Result<Readings, AdcError>
where
    A: AnalogInput,
    D: DelayNs,
{
    let mut filter = AveragingFilter::new(config.samples);
    let mut readings = Readings::new();

    for channel in &config.channels {
        let mean = sample_channel(
            input,
            channel.adc_channel,
            &mut filter,
            config.sample_interval_us,
            delay,
        )?;
        let volts = ChannelScale::for_channel(channel, input.span()).volts(mean);
        // Capacity matches the channel list
        let _ = readings.push(volts);
    }

    Ok(readings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeAdc, RecordingDelay};

    #[test]
    fn test_reference_scaling() {
        let mut adc = FakeAdc::new(1024)
            .with_level(0, 512)
            .with_script(1, &[1000, 1010])
            .with_level(2, 0);
        let mut delay = RecordingDelay::default();

        let readings = read_channels(&mut adc, &MeterConfig::default(), &mut delay).unwrap();

        assert_eq!(readings.len(), 3);
        assert_eq!(readings[0], 12.0 * 512.0 / 1024.0);
        assert!((readings[1] - 12.0 * 1005.0 / 1024.0).abs() < 1e-12);
        assert_eq!(readings[2], 0.0);
        assert_eq!(adc.reads, 30);
        assert_eq!(delay.total_us(), 30 * 200);
    }

    #[test]
    fn test_channel_mapping_from_config() {
        let mut config = MeterConfig::default();
        config.channels[0].adc_channel = 3;
        config.samples = 1;
        let mut adc = FakeAdc::new(1024)
            .with_level(3, 256)
            .with_level(1, 0)
            .with_level(2, 0);
        let mut delay = RecordingDelay::default();

        let readings = read_channels(&mut adc, &config, &mut delay).unwrap();

        assert_eq!(readings[0], 3.0);
        assert_eq!(adc.reads, 3);
    }

    #[test]
    fn test_stops_on_adc_error() {
        let mut adc = FakeAdc::new(1024).with_level(0, 10);
        let mut delay = RecordingDelay::default();

        let result = read_channels(&mut adc, &MeterConfig::default(), &mut delay);

        assert_eq!(result, Err(AdcError::Conversion));
        assert_eq!(adc.reads, 10);
    }
}
