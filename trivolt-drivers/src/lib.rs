//! Software driver implementations
//!
//! This crate provides implementations of the traits defined in
//! trivolt-hal for chips that lack the matching peripheral:
//!
//! - Two-wire bus controller bit-banged over open-drain GPIO

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod twi;

pub use twi::bitbang::BitBangTwi;
