//! Monetary amounts with decimal arithmetic.
//!
//! All prices in Huerta are Chilean pesos. Amounts are carried as
//! [`Decimal`] and rendered in the local convention (`$1.990`, thousands
//! separated by dots, decimals by a comma and only shown when non-zero).
//!
//! The backend is not consistent about how it encodes prices: most
//! endpoints send decimal strings, older ones send bare JSON numbers.
//! [`Money::from_wire`] accepts both and nothing else; the conversion
//! happens exactly once, at the API boundary.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Money`] value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    /// The input was not a valid decimal number.
    #[error("invalid money amount: {0:?}")]
    Invalid(String),
    /// The amount was negative; prices and totals are never negative.
    #[error("negative money amount: {0}")]
    Negative(Decimal),
}

/// A monetary amount in Chilean pesos.
///
/// Serialized as a decimal string (never a float) to preserve precision in
/// persisted carts and outbound order submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero pesos.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a money value from a raw decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Parse a wire-side price that may be a decimal string or a bare
    /// number.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyParseError::Invalid`] if the value is not a decimal
    /// number, and [`MoneyParseError::Negative`] if it parses but is below
    /// zero.
    pub fn from_wire(value: &WireAmount) -> Result<Self, MoneyParseError> {
        let amount = match value {
            WireAmount::Text(s) => s
                .trim()
                .parse::<Decimal>()
                .map_err(|_| MoneyParseError::Invalid(s.clone()))?,
            WireAmount::Int(n) => Decimal::from(*n),
            WireAmount::Float(f) => {
                Decimal::from_f64(*f).ok_or_else(|| MoneyParseError::Invalid(f.to_string()))?
            }
        };

        if amount.is_sign_negative() {
            return Err(MoneyParseError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Parse a decimal string such as `"1990.00"`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Money::from_wire`].
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        Self::from_wire(&WireAmount::Text(s.to_string()))
    }

    /// This amount multiplied by a line quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

/// A price as it may arrive from the backend: a decimal string or a bare
/// JSON number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireAmount {
    /// Decimal string, e.g. `"1990.00"`.
    Text(String),
    /// Integer number of pesos.
    Int(i64),
    /// Floating-point number (legacy endpoints).
    Float(f64),
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = self.0.normalize();
        let sign = if amount.is_sign_negative() { "-" } else { "" };
        let abs = amount.abs();
        let grouped = group_thousands(&abs.trunc().to_string());

        let frac = abs.fract();
        if frac.is_zero() {
            write!(f, "{sign}${grouped}")
        } else {
            let frac_str = frac.to_string();
            let digits = frac_str.split('.').nth(1).unwrap_or("0");
            write!(f, "{sign}${grouped},{digits}")
        }
    }
}

/// Insert a dot every three digits, counting from the right.
fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    let chars: Vec<char> = digits.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }
    grouped
}
