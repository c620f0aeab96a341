//! Money value object.
//!
//! Amounts are held as integer minor units (cents) and only rendered as
//! decimal text at the gateway boundary, where exactly two decimals are
//! required for checksum stability.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Amount of money in minor units (e.g. cents). Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates an amount from minor units.
    pub fn from_cents(cents: i64) -> Result<Self, ValidationError> {
        if cents < 0 {
            return Err(ValidationError::out_of_range(
                "amount",
                0,
                i32::MAX,
                i32::try_from(cents).unwrap_or(i32::MIN),
            ));
        }
        Ok(Self(cents))
    }

    /// Creates an amount from whole major units (e.g. 9000 rupees).
    pub fn from_major(units: i64) -> Result<Self, ValidationError> {
        Self::from_cents(units.saturating_mul(100))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Applies a whole-number percentage discount, rounding the discount
    /// half-up to the nearest minor unit.
    ///
    /// `amount = price - price * discount / 100`
    pub fn less_percent(&self, percent: u8) -> Money {
        let percent = i128::from(percent.min(100));
        let discount = (i128::from(self.0) * percent + 50) / 100;
        // discount never exceeds the price, so it fits back into i64
        let discount = i64::try_from(discount).unwrap_or(self.0);
        Money((self.0 - discount).max(0))
    }

    /// Renders the amount with exactly two decimals and no grouping,
    /// the form the gateway signs (`8010.00`).
    pub fn to_gateway_string(&self) -> String {
        format!("{}.{:02}", self.0 / 100, self.0 % 100)
    }

    /// Parses a decimal amount as sent back by the gateway (`"8010.00"`,
    /// `"8010"`, `"8010.5"`).
    pub fn parse_gateway(raw: &str) -> Result<Money, ValidationError> {
        let raw = raw.trim();
        let invalid = || ValidationError::invalid_format("amount", format!("'{}' is not a decimal amount", raw));

        let (whole, fraction) = match raw.split_once('.') {
            Some((w, f)) => (w, f),
            None => (raw, ""),
        };
        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if fraction.len() > 2 || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };
        Money::from_cents(whole.saturating_mul(100) + fraction)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_gateway_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eleven_percent_off_nine_thousand() {
        let price = Money::from_major(9000).unwrap();
        let amount = price.less_percent(11);
        assert_eq!(amount.cents(), 801_000);
        assert_eq!(amount.to_gateway_string(), "8010.00");
    }

    #[test]
    fn zero_discount_is_identity() {
        let price = Money::from_cents(123_456).unwrap();
        assert_eq!(price.less_percent(0), price);
    }

    #[test]
    fn full_discount_is_free() {
        let price = Money::from_major(2500).unwrap();
        assert_eq!(price.less_percent(100), Money::ZERO);
    }

    #[test]
    fn discount_on_largest_price_does_not_overflow() {
        let price = Money::from_major(i64::MAX).unwrap();
        let amount = price.less_percent(11);
        assert!(amount < price);
        assert!(amount > Money::ZERO);
        assert_eq!(price.less_percent(100), Money::ZERO);
    }

    #[test]
    fn discount_rounds_half_up() {
        // 333 cents * 15% = 49.95 -> 50 cents discount
        let price = Money::from_cents(333).unwrap();
        assert_eq!(price.less_percent(15).cents(), 283);
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(Money::from_cents(-1).is_err());
    }

    #[test]
    fn gateway_string_pads_cents() {
        assert_eq!(Money::from_cents(5).unwrap().to_gateway_string(), "0.05");
        assert_eq!(Money::from_cents(1_000).unwrap().to_gateway_string(), "10.00");
    }

    #[test]
    fn parses_gateway_amounts() {
        assert_eq!(Money::parse_gateway("8010.00").unwrap().cents(), 801_000);
        assert_eq!(Money::parse_gateway("8010").unwrap().cents(), 801_000);
        assert_eq!(Money::parse_gateway("12.5").unwrap().cents(), 1_250);
    }

    #[test]
    fn rejects_malformed_gateway_amounts() {
        for raw in ["", "-10.00", "10.001", "abc", ".50", "1,000.00"] {
            assert!(Money::parse_gateway(raw).is_err(), "accepted {:?}", raw);
        }
    }
}
