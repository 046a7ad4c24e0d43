//! Trivolt Hardware Abstraction Layer
//!
//! This crate defines hardware abstraction traits that can be implemented
//! by chip-specific HALs (RP2040, AVR, etc.) or by software drivers. This
//! enables the same bus and display code to run on different hardware
//! platforms, and on the host under test.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (trivolt-firmware)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  trivolt-core (bus engine, LCD, meter)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  trivolt-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ trivolt-hal-  │       │ trivolt-      │
//! │    rp2040     │       │ drivers       │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`twi::TwiController`] - Status-register level two-wire bus controller
//! - [`gpio::OpenDrainPin`] - Open-drain line for bus signalling
//! - [`adc::AnalogInput`] - Multi-channel analog sampling

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod gpio;
#[cfg(feature = "sim")]
pub mod sim;
pub mod twi;

// Re-export key traits at crate root for convenience
pub use adc::{AdcError, AnalogInput};
pub use gpio::OpenDrainPin;
pub use twi::{BitTiming, Command, TwiConfig, TwiController};
