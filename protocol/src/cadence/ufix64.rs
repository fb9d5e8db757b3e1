//! Cadence `UFix64`: unsigned 64-bit fixed point with 8 decimal places.
//!
//! Stored as the scaled integer (`value * 10^8`). Always rendered with
//! exactly eight fractional digits, which is the only textual form the
//! JSON-Cadence decoder on the network accepts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::CadenceError;

/// Number of fractional decimal digits.
pub const UFIX64_DECIMALS: u32 = 8;

const SCALE: u64 = 10u64.pow(UFIX64_DECIMALS);

/// A non-negative fixed-point number with 8 decimals.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UFix64(u64);

impl UFix64 {
    pub const ZERO: UFix64 = UFix64(0);

    /// Construct from the scaled integer representation.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Whole units, e.g. `UFix64::from_units(10)` is `10.00000000`.
    pub fn from_units(units: u64) -> Option<Self> {
        units.checked_mul(SCALE).map(Self)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl FromStr for UFix64 {
    type Err = CadenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CadenceError::InvalidUFix64(s.to_string());
        let text = s.trim();
        let (whole, frac) = match text.split_once('.') {
            Some((w, f)) => (w, f),
            None => (text, ""),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac.len() > UFIX64_DECIMALS as usize || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if text.ends_with('.') {
            return Err(invalid());
        }

        let whole: u64 = whole.parse().map_err(|_| invalid())?;
        let mut frac_value: u64 = 0;
        for digit in frac.bytes() {
            frac_value = frac_value * 10 + u64::from(digit - b'0');
        }
        frac_value *= 10u64.pow(UFIX64_DECIMALS - frac.len() as u32);

        whole
            .checked_mul(SCALE)
            .and_then(|w| w.checked_add(frac_value))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl TryFrom<String> for UFix64 {
    type Error = CadenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UFix64> for String {
    fn from(value: UFix64) -> Self {
        value.to_string()
    }
}

impl fmt::Display for UFix64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:08}", self.0 / SCALE, self.0 % SCALE)
    }
}

impl fmt::Debug for UFix64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UFix64({})", self)
    }
}
