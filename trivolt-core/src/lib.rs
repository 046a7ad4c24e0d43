//! Board-agnostic core logic for the voltmeter firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Two-wire bus master protocol engine
//! - Character LCD command sequencing and text rendering
//! - Fixed-point number formatting
//! - Sampling pipeline (averaging filter, scaling, screen layout)
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod config;
pub mod format;
pub mod lcd;
pub mod meter;
pub mod twi;

#[cfg(test)]
pub(crate) mod test_support;
