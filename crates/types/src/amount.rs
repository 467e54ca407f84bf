//! Monetary amounts recorded as territory prices.
//!
//! Prices are stored as fixed-point integers with 18 decimal places, so
//! `1` whole unit equals `10^18` base units. All arithmetic stays in integers
//! and parsing never goes through floating point.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of decimal places carried by an [`Amount`].
pub const AMOUNT_DECIMALS: u32 = 18;

/// Base units in one whole unit.
pub const BASE_UNITS_PER_UNIT: u128 = 10u128.pow(AMOUNT_DECIMALS);

/// Errors raised when parsing a decimal amount string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount string is empty")]
    Empty,
    #[error("amount must not be negative")]
    Negative,
    #[error("invalid digits in amount: {0}")]
    InvalidDigits(String),
    #[error("too many decimal places (max {AMOUNT_DECIMALS})")]
    TooManyDecimals,
    #[error("amount exceeds the representable range")]
    Overflow,
}

/// Non-negative monetary amount in base units.
///
/// Serialised as its exact decimal string (`"1"`, `"0.25"`), so the value
/// survives formats and buffered enums that cannot carry a `u128`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(pub u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_base_units(base: u128) -> Self {
        Self(base)
    }

    /// Whole units, saturating at the top of the range.
    pub fn from_whole_units(units: u64) -> Self {
        Self((units as u128).saturating_mul(BASE_UNITS_PER_UNIT))
    }

    pub fn base_units(&self) -> u128 {
        self.0
    }

    pub fn whole_units(&self) -> u128 {
        self.0 / BASE_UNITS_PER_UNIT
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Parse a decimal string such as `"1"`, `"0.25"` or `"12.000000000000000001"`.
    pub fn parse_units(s: &str) -> Result<Self, AmountError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountError::Empty);
        }
        if s.starts_with('-') {
            return Err(AmountError::Negative);
        }

        let (whole, fraction) = match s.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (s, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(AmountError::InvalidDigits(s.to_string()));
        }
        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if !all_digits(whole) || !all_digits(fraction) {
            return Err(AmountError::InvalidDigits(s.to_string()));
        }
        if fraction.len() > AMOUNT_DECIMALS as usize {
            return Err(AmountError::TooManyDecimals);
        }

        let whole_value: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| AmountError::Overflow)?
        };

        let fraction_value: u128 = if fraction.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", fraction, width = AMOUNT_DECIMALS as usize);
            padded.parse().map_err(|_| AmountError::Overflow)?
        };

        whole_value
            .checked_mul(BASE_UNITS_PER_UNIT)
            .and_then(|base| base.checked_add(fraction_value))
            .map(Amount)
            .ok_or(AmountError::Overflow)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse_units(s)
    }
}

impl From<Amount> for String {
    fn from(value: Amount) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Amount {
    type Error = AmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Amount::parse_units(&value)
    }
}

impl From<u128> for Amount {
    fn from(base: u128) -> Self {
        Amount(base)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / BASE_UNITS_PER_UNIT;
        let fraction = self.0 % BASE_UNITS_PER_UNIT;

        if fraction == 0 {
            write!(f, "{whole}")
        } else {
            let digits = format!("{fraction:018}");
            write!(f, "{whole}.{}", digits.trim_end_matches('0'))
        }
    }
}
