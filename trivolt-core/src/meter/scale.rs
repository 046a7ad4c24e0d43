//! Raw counts to volts

use crate::config::ChannelConfig;

/// Linear conversion from converter counts to volts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelScale {
    /// Voltage a reading of `adc_span` would represent (mV)
    pub full_scale_mv: u32,
    /// Distinct counts of the converter
    pub adc_span: u16,
}

impl ChannelScale {
    /// `full_scale_mv` at `adc_span` counts
    pub fn new(full_scale_mv: u32, adc_span: u16) -> Self {
        Self {
            full_scale_mv,
            adc_span,
        }
    }

    /// Scale for `channel` on a converter with `adc_span` counts
    pub fn for_channel(channel: &ChannelConfig, adc_span: u16) -> Self {
        Self::new(channel.full_scale_mv, adc_span)
    }

    /// `full_scale * counts / span`, in volts
    pub fn volts(&self, counts: u16) -> f64 {
        if self.adc_span == 0 {
            return 0.0;
        }
        self.full_scale_mv as f64 * counts as f64 / (self.adc_span as f64 * 1000.0)
    }
}
