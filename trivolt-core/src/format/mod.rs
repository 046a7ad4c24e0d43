//! Numeric-to-text formatting
//!
//! Renders readings as `[-]digits['.'digits]` with an exact number of
//! fractional digits, into caller-provided storage, without touching any
//! I/O. Output is NUL-terminated so it can be handed to
//! [`Lcd::print_cstr`](crate::lcd::Lcd::print_cstr) unchanged.

pub mod fixed;

pub use fixed::FixedPoint;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Most fractional digits a value can be rendered with
pub const MAX_FRACTION_DIGITS: u8 = 9;

/// Longest rendering without the terminator: sign, 20 integer digits,
/// point and fraction
pub const MAX_RENDERED_LEN: usize = 1 + 20 + 1 + MAX_FRACTION_DIGITS as usize;

/// How the fractional remainder becomes digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FractionMode {
    /// Scale and cut off (0.999 at 2 digits shows 0.99)
    ///
    /// Matches the firmware this meter replaces, so readings compare
    /// digit for digit with the old units.
    #[default]
    Truncate,
    /// Scale and round half up, carrying into the integer part
    Round,
}

/// Errors from the formatter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FormatError {
    /// Output plus terminator does not fit the buffer
    BufferTooSmall,
    /// More than [`MAX_FRACTION_DIGITS`] requested
    TooManyDigits,
    /// NaN or infinite input
    NotFinite,
    /// Magnitude does not fit the integer part
    OutOfRange,
}

/// Render `value` with `digits` fractional digits into `buf`
///
/// Uses [`FractionMode::Truncate`]. Returns the rendered text, which
/// borrows `buf`; a NUL follows it in `buf`.
///
/// ```
/// let mut buf = [0u8; 16];
/// assert_eq!(trivolt_core::format::format(12.34, 2, &mut buf), Ok("12.34"));
/// assert_eq!(buf[5], 0);
/// ```
pub fn format(value: f64, digits: u8, buf: &mut [u8]) -> Result<&str, FormatError> {
    format_with(value, digits, FractionMode::Truncate, buf)
}

/// Render `value` with `digits` fractional digits using `mode`
pub fn format_with(
    value: f64,
    digits: u8,
    mode: FractionMode,
    buf: &mut [u8],
) -> Result<&str, FormatError> {
    let len = FixedPoint::from_f64(value, digits, mode)?.write_to(buf)?;
    // Only ASCII digits, '-' and '.' are ever written
    Ok(core::str::from_utf8(&buf[..len]).unwrap_or(""))
}
