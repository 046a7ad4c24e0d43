//! Meter configuration loading
//!
//! build.rs compiles meter.toml into a postcard image; this module decodes
//! it at boot. A bad image falls back to the reference defaults so the
//! meter still shows something.

use defmt::*;

use trivolt_core::config::{ConfigError, MeterConfig};

/// Configuration image produced by build.rs
const CONFIG_IMAGE: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/meter.bin"));

/// Configuration loading errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadError {
    /// Image could not be decoded
    Deserialize,
    /// Image decoded but holds unusable values
    Invalid(ConfigError),
}

impl From<ConfigError> for LoadError {
    fn from(e: ConfigError) -> Self {
        LoadError::Invalid(e)
    }
}

/// Decode and validate the embedded configuration
pub fn decode(image: &[u8]) -> Result<MeterConfig, LoadError> {
    let config: MeterConfig = postcard::from_bytes(image).map_err(|_| LoadError::Deserialize)?;
    config.validate()?;
    Ok(config)
}

/// Embedded configuration, or the defaults if it cannot be used
pub fn load() -> MeterConfig {
    match decode(CONFIG_IMAGE) {
        Ok(config) => {
            info!(
                "Loaded meter config: {} channels, {} samples",
                config.channels.len(),
                config.samples
            );
            config
        }
        Err(e) => {
            warn!("Config image unusable ({}), using defaults", e);
            MeterConfig::default()
        }
    }
}
