//! Meter configuration
//!
//! Configuration is authored as TOML next to the firmware, validated at
//! build time and embedded as postcard-serialized binary data. The types
//! here carry the reference hardware values as their defaults.

pub mod types;

pub use types::{
    BusConfig, ChannelConfig, ConfigError, DisplayConfig, MeterConfig, MAX_CHANNELS,
    MAX_LABEL_LEN, MAX_SAMPLES,
};
