//! RP2040-specific HAL for the voltmeter firmware
//!
//! This crate provides RP2040-specific implementations of the
//! trivolt-hal traits:
//! - Open-drain GPIO lines for the bit-banged two-wire bus
//! - Blocking ADC input with channel management

#![no_std]

pub mod adc;
pub mod gpio;

pub use adc::{AdcChannel, BlockingAdc};
pub use gpio::OpenDrain;
