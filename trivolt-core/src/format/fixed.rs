//! Fixed-point decimal values

use core::fmt::{self, Write};

use heapless::String;

use super::{FormatError, FractionMode, MAX_FRACTION_DIGITS, MAX_RENDERED_LEN};

/// Headroom, in units of the input's last bit, added before truncating
///
/// `12.34` is stored as `12.3399999…`; without it truncation would print
/// `12.33`. Four ulps of the input absorb the representation error of any
/// decimal literal.
const TRUNCATE_GUARD_ULPS: f64 = 4.0;

/// Largest guard, in steps of the last printed digit
///
/// Once the input's ulps reach the last digit the guard would invent
/// digits; past this point the digit is resolved to the nearest step.
const TRUNCATE_GUARD_MAX: f64 = 0.5;

/// A decimal value with a fixed number of fractional digits
///
/// Built from a reading, rendered, then dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FixedPoint {
    negative: bool,
    integer: u64,
    fraction: u32,
    digits: u8,
}

impl FixedPoint {
    /// Split `value` into integer and `digits` fractional digits
    ///
    /// The integer part is `value` truncated toward zero. The remainder is
    /// scaled by `10^digits` and converted with `mode`; a rounded fraction
    /// that reaches `10^digits` carries into the integer part. A result
    /// whose digits are all zero is never negative.
    pub fn from_f64(value: f64, digits: u8, mode: FractionMode) -> Result<Self, FormatError> {
        if !value.is_finite() {
            return Err(FormatError::NotFinite);
        }
        if digits > MAX_FRACTION_DIGITS {
            return Err(FormatError::TooManyDigits);
        }

        let magnitude = if value < 0.0 { -value } else { value };
        if magnitude >= u64::MAX as f64 {
            return Err(FormatError::OutOfRange);
        }

        let scale = 10u64.pow(digits as u32);
        let mut integer = magnitude as u64;
        let remainder = magnitude - integer as f64;
        let scaled = remainder * scale as f64;

        let mut fraction = match mode {
            FractionMode::Truncate => {
                let guard = (magnitude * scale as f64 * f64::EPSILON * TRUNCATE_GUARD_ULPS)
                    .min(TRUNCATE_GUARD_MAX);
                // The integer part is never touched by truncation
                ((scaled + guard) as u64).min(scale - 1)
            }
            FractionMode::Round => (scaled + 0.5) as u64,
        };

        if fraction >= scale {
            fraction -= scale;
            integer = integer.checked_add(1).ok_or(FormatError::OutOfRange)?;
        }
        if fraction >= scale {
            return Err(FormatError::OutOfRange);
        }
        let fraction = u32::try_from(fraction).map_err(|_| FormatError::OutOfRange)?;

        Ok(Self {
            negative: value < 0.0 && (integer != 0 || fraction != 0),
            integer,
            fraction,
            digits,
        })
    }

    /// Value given as an integer count of `10^-digits` units
    ///
    /// `from_scaled(12_345, 3)` is `12.345`.
    pub fn from_scaled(scaled: i64, digits: u8) -> Result<Self, FormatError> {
        if digits > MAX_FRACTION_DIGITS {
            return Err(FormatError::TooManyDigits);
        }

        let scale = 10u64.pow(digits as u32);
        let magnitude = scaled.unsigned_abs();

        Ok(Self {
            negative: scaled < 0,
            integer: magnitude / scale,
            fraction: (magnitude % scale) as u32,
            digits,
        })
    }

    /// Whether a minus sign is printed
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Integer part, without sign
    pub fn integer(&self) -> u64 {
        self.integer
    }

    /// Fractional digits as an integer (`5` for `.05` at two digits)
    pub fn fraction(&self) -> u32 {
        self.fraction
    }

    /// Number of fractional digits printed
    pub fn digits(&self) -> u8 {
        self.digits
    }

    /// Characters written by [`write_to`](Self::write_to), terminator excluded
    pub fn rendered_len(&self) -> usize {
        let sign = usize::from(self.negative);
        let point = if self.digits > 0 {
            1 + self.digits as usize
        } else {
            0
        };
        sign + count_digits(self.integer) + point
    }

    /// Write the text and a NUL terminator into `buf`
    ///
    /// Returns the text length. `buf` must hold the text plus one byte.
    pub fn write_to(&self, buf: &mut [u8]) -> Result<usize, FormatError> {
        let len = self.rendered_len();
        if buf.len() < len + 1 {
            return Err(FormatError::BufferTooSmall);
        }

        let mut pos = 0;
        if self.negative {
            buf[pos] = b'-';
            pos += 1;
        }

        pos += write_digits(self.integer, count_digits(self.integer), &mut buf[pos..]);

        if self.digits > 0 {
            buf[pos] = b'.';
            pos += 1;
            pos += write_digits(self.fraction as u64, self.digits as usize, &mut buf[pos..]);
        }

        buf[pos] = 0;
        Ok(pos)
    }

    /// Render into a fixed-capacity string
    pub fn to_string<const N: usize>(&self) -> Result<String<N>, FormatError> {
        let mut text = String::new();
        write!(text, "{}", self).map_err(|_| FormatError::BufferTooSmall)?;
        Ok(text)
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0u8; MAX_RENDERED_LEN + 1];
        let len = self.write_to(&mut buf).map_err(|_| fmt::Error)?;
        f.write_str(core::str::from_utf8(&buf[..len]).map_err(|_| fmt::Error)?)
    }
}

/// Decimal digits needed for `value`, at least one
fn count_digits(mut value: u64) -> usize {
    let mut count = 1;
    while value >= 10 {
        value /= 10;
        count += 1;
    }
    count
}

/// Write `value` as exactly `width` digits, most significant first
///
/// Zero-pads on the left; `width` must be at least `count_digits(value)`.
fn write_digits(mut value: u64, width: usize, out: &mut [u8]) -> usize {
    for slot in out[..width].iter_mut().rev() {
        *slot = b'0' + (value % 10) as u8;
        value /= 10;
    }
    width
}
