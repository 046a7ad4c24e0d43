//! Configuration type definitions

use heapless::{String, Vec};
use trivolt_hal::twi::BitTiming;

use crate::format::{FractionMode, MAX_FRACTION_DIGITS};
use crate::lcd::command::{LINE_CAPACITY, ROWS};
use crate::twi::{RetryPolicy, Timeout};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum label length
pub const MAX_LABEL_LEN: usize = 8;

/// Maximum analog channels shown on the display
pub const MAX_CHANNELS: usize = 3;

/// Maximum samples averaged per reading
pub const MAX_SAMPLES: u16 = 1024;

/// Errors found while validating a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Device address outside the 7-bit range
    InvalidAddress,
    /// Bus clock of zero, or too fast for the CPU clock
    InvalidClock,
    /// No channels configured
    NoChannels,
    /// Channel asks for more fractional digits than the formatter supports
    TooManyDigits { channel: u8 },
    /// Channel placed on a row the display does not have
    InvalidRow { channel: u8 },
    /// Channel label uses non-printable or non-ASCII characters
    InvalidLabel { channel: u8 },
    /// Channel full scale of zero
    InvalidScale { channel: u8 },
    /// Sample count of zero or above [`MAX_SAMPLES`]
    InvalidSampleCount,
    /// A display row would overrun the controller's line memory
    RowTooLong { row: u8 },
}

/// Two-wire bus settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BusConfig {
    /// CPU clock feeding the bit-rate generator (Hz)
    pub cpu_hz: u32,
    /// Target SCL frequency (Hz)
    pub scl_hz: u32,
    /// Poll budget for a single controller wait
    pub timeout_polls: u32,
    /// Ignore `timeout_polls` and wait for the controller indefinitely
    pub wait_forever: bool,
    /// Ack-polling retries before giving up on a busy device
    pub max_retries: u32,
    /// Ignore `max_retries` and poll until the device answers
    pub retry_forever: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            cpu_hz: 16_000_000,
            scl_hz: 100_000,
            timeout_polls: 50_000,
            wait_forever: false,
            max_retries: 1_000,
            retry_forever: false,
        }
    }
}

impl BusConfig {
    /// Bit-rate settings for the controller
    pub fn timing(&self) -> BitTiming {
        BitTiming::for_clock(self.cpu_hz, self.scl_hz)
    }

    /// Controller wait budget
    pub fn timeout(&self) -> Timeout {
        if self.wait_forever {
            Timeout::Never
        } else {
            Timeout::Polls(self.timeout_polls)
        }
    }

    /// Ack-polling policy
    pub fn retry(&self) -> RetryPolicy {
        if self.retry_forever {
            RetryPolicy::Forever
        } else {
            RetryPolicy::Bounded(self.max_retries)
        }
    }
}

/// Character display settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DisplayConfig {
    /// 7-bit bus address of the LCD text controller
    pub address: u8,
    /// Wait between the phases of one instruction (µs)
    pub phase_us: u32,
    /// Wait after each instruction's stop (µs)
    pub settle_us: u32,
    /// Wait after power-up before the first instruction (ms)
    pub power_up_ms: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            address: 0x3E,
            phase_us: 20,
            settle_us: 40,
            power_up_ms: 30,
        }
    }
}

/// One measured input
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChannelConfig {
    /// Text printed before the value
    pub label: String<MAX_LABEL_LEN>,
    /// Analog input channel
    pub adc_channel: u8,
    /// Voltage represented by a full-scale reading (mV)
    pub full_scale_mv: u32,
    /// Fractional digits shown
    pub digits: u8,
    /// Display row the channel is printed on
    pub row: u8,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            label: String::new(),
            adc_channel: 0,
            full_scale_mv: 12_000,
            digits: 2,
            row: 0,
        }
    }
}

impl ChannelConfig {
    /// Channel with the given label on `adc_channel`, shown on `row`
    pub fn new(label: &str, adc_channel: u8, row: u8) -> Self {
        let mut text = String::new();
        for ch in label.chars() {
            if text.push(ch).is_err() {
                break;
            }
        }

        Self {
            label: text,
            adc_channel,
            row,
            ..Self::default()
        }
    }

    /// Widest rendering of this channel: label, value and separator
    fn max_width(&self) -> usize {
        // Rounding can lift a reading just below full scale to the next volt
        let mut int_digits = 1;
        let mut volts = self.full_scale_mv.div_ceil(1000);
        while volts >= 10 {
            volts /= 10;
            int_digits += 1;
        }
        let fraction = if self.digits > 0 {
            1 + self.digits as usize
        } else {
            0
        };
        self.label.len() + int_digits + fraction + 1
    }
}

/// Complete meter configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MeterConfig {
    /// Bus settings
    pub bus: BusConfig,
    /// Display settings
    pub display: DisplayConfig,
    /// Measured inputs, in display order
    pub channels: Vec<ChannelConfig, MAX_CHANNELS>,
    /// Samples averaged per reading
    pub samples: u16,
    /// Wait between samples (µs)
    pub sample_interval_us: u32,
    /// Wait between display refreshes (ms)
    pub refresh_ms: u32,
    /// How the last fractional digit is produced
    pub fraction_mode: FractionMode,
}

impl Default for MeterConfig {
    fn default() -> Self {
        let mut channels = Vec::new();
        let _ = channels.push(ChannelConfig::new("Q1:-", 0, 0));
        let _ = channels.push(ChannelConfig::new("Q2:-", 1, 1));
        let _ = channels.push(ChannelConfig::new("V:", 2, 1));

        Self {
            bus: BusConfig::default(),
            display: DisplayConfig::default(),
            channels,
            samples: 10,
            sample_interval_us: 200,
            refresh_ms: 20,
            fraction_mode: FractionMode::default(),
        }
    }
}

impl MeterConfig {
    /// Check the configuration for values the firmware cannot honour
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display.address > 0x77 || self.display.address < 0x08 {
            return Err(ConfigError::InvalidAddress);
        }

        if self.bus.scl_hz == 0 || self.bus.cpu_hz / self.bus.scl_hz < 16 {
            return Err(ConfigError::InvalidClock);
        }

        if self.channels.is_empty() {
            return Err(ConfigError::NoChannels);
        }

        if self.samples == 0 || self.samples > MAX_SAMPLES {
            return Err(ConfigError::InvalidSampleCount);
        }

        for (index, channel) in self.channels.iter().enumerate() {
            let index = index as u8;
            if channel.digits > MAX_FRACTION_DIGITS {
                return Err(ConfigError::TooManyDigits { channel: index });
            }
            if channel.row >= ROWS {
                return Err(ConfigError::InvalidRow { channel: index });
            }
            if !channel.label.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
                return Err(ConfigError::InvalidLabel { channel: index });
            }
            if channel.full_scale_mv == 0 {
                return Err(ConfigError::InvalidScale { channel: index });
            }
        }

        for row in 0..ROWS {
            let width: usize = self
                .channels
                .iter()
                .filter(|c| c.row == row)
                .map(ChannelConfig::max_width)
                .sum();
            if width > LINE_CAPACITY as usize {
                return Err(ConfigError::RowTooLong { row });
            }
        }

        Ok(())
    }

    /// Channels printed on `row`, in display order
    pub fn channels_on_row(&self, row: u8) -> impl Iterator<Item = &ChannelConfig> {
        self.channels.iter().filter(move |c| c.row == row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_reference_hardware() {
        let config = MeterConfig::default();
        assert_eq!(config.display.address, 0x3E);
        assert_eq!(config.bus.timing().divider, 72);
        assert_eq!(config.samples, 10);
        assert_eq!(config.channels.len(), 3);
        assert_eq!(config.channels[2].label.as_str(), "V:");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_width_covers_rounded_full_scale() {
        let mut channel = ChannelConfig::new("V:", 2, 1);
        channel.full_scale_mv = 9_999;

        let mut buf = [0u8; 16];
        let text =
            crate::format::format_with(9.9999, channel.digits, FractionMode::Round, &mut buf)
                .unwrap();
        assert_eq!(text, "10.00");
        assert_eq!(channel.max_width(), "V:".len() + text.len() + 1);

        channel.full_scale_mv = 12_000;
        assert_eq!(channel.max_width(), "V:".len() + "12.00".len() + 1);
    }

    #[test]
    fn test_policies_from_flags() {
        let mut bus = BusConfig::default();
        assert_eq!(bus.timeout(), Timeout::Polls(50_000));
        assert_eq!(bus.retry(), RetryPolicy::Bounded(1_000));

        bus.wait_forever = true;
        bus.retry_forever = true;
        assert_eq!(bus.timeout(), Timeout::Never);
        assert_eq!(bus.retry(), RetryPolicy::Forever);
    }

    #[test]
    fn test_rejects_bad_address() {
        let mut config = MeterConfig::default();
        config.display.address = 0x80;
        assert_eq!(config.validate(), Err(ConfigError::InvalidAddress));
    }

    #[test]
    fn test_rejects_bus_faster_than_cpu_allows() {
        let mut config = MeterConfig::default();
        config.bus.scl_hz = 2_000_000;
        assert_eq!(config.validate(), Err(ConfigError::InvalidClock));
    }

    #[test]
    fn test_rejects_too_many_digits() {
        let mut config = MeterConfig::default();
        config.channels[1].digits = 12;
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooManyDigits { channel: 1 })
        );
    }

    #[test]
    fn test_rejects_overfull_row() {
        let mut config = MeterConfig::default();
        config.channels[1] = ChannelConfig {
            digits: 9,
            ..ChannelConfig::new("Channel2", 1, 1)
        };
        config.channels[2] = ChannelConfig {
            digits: 9,
            ..ChannelConfig::new("Channel3", 2, 1)
        };
        assert_eq!(config.validate(), Err(ConfigError::RowTooLong { row: 1 }));
    }

    #[test]
    fn test_rejects_zero_samples() {
        let mut config = MeterConfig::default();
        config.samples = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidSampleCount));
    }

    #[test]
    fn test_label_truncated_to_capacity() {
        let channel = ChannelConfig::new("Channel-One", 0, 0);
        assert_eq!(channel.label.as_str(), "Channel-");
    }

    #[test]
    fn test_channels_on_row() {
        let config = MeterConfig::default();
        let row1: std::vec::Vec<&str> = config
            .channels_on_row(1)
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(row1, ["Q2:-", "V:"]);
    }
}
