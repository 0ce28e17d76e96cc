//! Prices

use std::{fmt, iter::Sum};

use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Errors produced while interpreting a raw price.
#[derive(Debug, Error, PartialEq)]
pub enum PriceError {
    /// The value was NaN or infinite.
    #[error("price is not a finite number")]
    NotFinite,

    /// The value was zero or negative where a positive price is required.
    #[error("price must be positive, got {0}")]
    NotPositive(Price),

    /// The value does not fit in minor units.
    #[error("price {0} is out of range")]
    OutOfRange(String),

    /// The value could not be parsed as a number.
    #[error("invalid price: {0}")]
    Invalid(String),
}

/// A price held in minor units (cents).
///
/// Persisted as a JSON number in major units, so `45000` is forty-five
/// thousand and `12.5` is twelve-fifty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(i64);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(0);

    /// Creates a price from minor units.
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Creates a price from whole major units.
    pub const fn from_major(major: i64) -> Self {
        Self(major.saturating_mul(MINOR_UNITS_PER_MAJOR))
    }

    /// Creates a price from a decimal amount in major units, rounding to the nearest minor unit.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::OutOfRange`] if the amount does not fit in minor units.
    pub fn from_decimal(amount: Decimal) -> Result<Self, PriceError> {
        amount
            .checked_mul(Decimal::new(MINOR_UNITS_PER_MAJOR, 0))
            .and_then(|value| {
                value
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                    .to_i64()
            })
            .map(Self)
            .ok_or_else(|| PriceError::OutOfRange(amount.to_string()))
    }

    /// Creates a price from a floating point amount in major units.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotFinite`] for NaN or infinities and
    /// [`PriceError::OutOfRange`] for amounts that do not fit.
    pub fn from_f64(amount: f64) -> Result<Self, PriceError> {
        if !amount.is_finite() {
            return Err(PriceError::NotFinite);
        }

        let decimal = Decimal::from_f64(amount)
            .ok_or_else(|| PriceError::OutOfRange(amount.to_string()))?;

        Self::from_decimal(decimal)
    }

    /// Parses a price from text such as `"45000"` or `"12.50"`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Invalid`] if the text is not a number.
    pub fn parse(raw: &str) -> Result<Self, PriceError> {
        let amount = raw
            .trim()
            .parse::<Decimal>()
            .map_err(|_err| PriceError::Invalid(raw.to_string()))?;

        Self::from_decimal(amount)
    }

    /// Interprets a loosely typed JSON value: numbers and numeric strings are accepted.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] for anything that is not numeric.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, PriceError> {
        match value {
            serde_json::Value::Number(number) => {
                if let Some(whole) = number.as_i64() {
                    return Ok(Self::from_major(whole));
                }

                number
                    .as_f64()
                    .ok_or_else(|| PriceError::Invalid(number.to_string()))
                    .and_then(Self::from_f64)
            }
            serde_json::Value::String(text) => Self::parse(text),
            other => Err(PriceError::Invalid(other.to_string())),
        }
    }

    /// Returns the amount in minor units.
    pub const fn to_minor_units(self) -> i64 {
        self.0
    }

    /// Returns the amount in major units as a decimal.
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Returns the amount in major units as a float, for loosely typed consumers.
    pub fn to_major_f64(self) -> f64 {
        self.to_decimal().to_f64().unwrap_or_default()
    }

    /// Whether the price is strictly greater than zero.
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns the price if it is positive.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotPositive`] for zero or negative prices.
    pub fn require_positive(self) -> Result<Self, PriceError> {
        if self.is_positive() {
            Ok(self)
        } else {
            Err(PriceError::NotPositive(self))
        }
    }

    /// Multiplies the price by a quantity, saturating on overflow.
    #[must_use]
    pub fn times(self, qty: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(qty)))
    }

    /// Converts the price into money of the given currency.
    pub fn to_money(self, currency: &'static Currency) -> Money<'static, Currency> {
        Money::from_minor(self.0, currency)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, price| Self(acc.0.saturating_add(price.0)))
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % MINOR_UNITS_PER_MAJOR == 0 {
            serializer.serialize_i64(self.0 / MINOR_UNITS_PER_MAJOR)
        } else {
            serializer.serialize_f64(self.to_major_f64())
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Whole(i64),
    Fractional(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawPrice::deserialize(deserializer)? {
            RawPrice::Whole(whole) => Ok(Self::from_major(whole)),
            RawPrice::Fractional(amount) => Self::from_f64(amount).map_err(de::Error::custom),
            RawPrice::Text(text) => Self::parse(&text).map_err(de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso;
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn from_major_scales_to_minor_units() {
        assert_eq!(Price::from_major(45_000).to_minor_units(), 4_500_000);
    }

    #[test]
    fn from_f64_converts_major_units() -> TestResult {
        assert_eq!(Price::from_f64(12.5)?.to_minor_units(), 1_250);
        assert_eq!(Price::from_f64(0.1)?.to_minor_units(), 10);

        Ok(())
    }

    #[test]
    fn from_f64_rejects_nan_and_infinity() {
        assert_eq!(Price::from_f64(f64::NAN), Err(PriceError::NotFinite));
        assert_eq!(Price::from_f64(f64::INFINITY), Err(PriceError::NotFinite));
    }

    #[test]
    fn parse_accepts_numeric_text() -> TestResult {
        assert_eq!(Price::parse(" 12500 ")?, Price::from_major(12_500));
        assert!(matches!(Price::parse("abc"), Err(PriceError::Invalid(_))));

        Ok(())
    }

    #[test]
    fn from_json_accepts_numbers_and_strings_only() -> TestResult {
        assert_eq!(Price::from_json(&json!(100))?, Price::from_major(100));
        assert_eq!(Price::from_json(&json!("99.99"))?, Price::from_minor(9_999));
        assert!(Price::from_json(&json!(null)).is_err());
        assert!(Price::from_json(&json!(true)).is_err());
        assert!(Price::from_json(&json!("NaN")).is_err());

        Ok(())
    }

    #[test]
    fn require_positive_rejects_zero() {
        assert_eq!(
            Price::ZERO.require_positive(),
            Err(PriceError::NotPositive(Price::ZERO))
        );
    }

    #[test]
    fn whole_prices_serialize_as_integers() -> TestResult {
        assert_eq!(serde_json::to_string(&Price::from_major(45_000))?, "45000");
        assert_eq!(serde_json::to_string(&Price::from_minor(1_250))?, "12.5");

        Ok(())
    }

    #[test]
    fn deserializes_numbers_and_numeric_strings() -> TestResult {
        let prices: Vec<Price> = serde_json::from_str(r#"[6500, 12.5, "300"]"#)?;

        assert_eq!(
            prices,
            vec![
                Price::from_major(6_500),
                Price::from_minor(1_250),
                Price::from_major(300)
            ]
        );

        Ok(())
    }

    #[test]
    fn sum_and_times_saturate() {
        let total: Price = [Price::from_major(100).times(2), Price::from_major(50)]
            .into_iter()
            .sum();

        assert_eq!(total, Price::from_major(250));
        assert_eq!(Price::from_minor(i64::MAX).times(2), Price::from_minor(i64::MAX));
    }

    #[test]
    fn converts_to_money() {
        assert_eq!(
            Price::from_major(250).to_money(iso::USD),
            Money::from_minor(25_000, iso::USD)
        );
    }
}
