//! Cart Lines
//!
//! The validated line type, the loosely typed input accepted by
//! [`CartManager::add_item`](crate::cart::CartManager::add_item) and the strict
//! reader applied to persisted lines.

use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::prices::{Price, PriceError};

/// Image shown when a line carries none.
pub const FALLBACK_IMAGE: &str = "./assets/hero-watch-D40AmJ87.jpg";

/// Name used when an added item carries none.
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// Reasons a line is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum LineError {
    /// The stored entry is not a JSON object.
    #[error("cart line is not an object")]
    NotAnObject,

    /// The identifier is missing or blank.
    #[error("cart line has no id")]
    MissingId,

    /// The name is missing or blank.
    #[error("cart line {0} has no name")]
    MissingName(String),

    /// The price is missing, non-numeric or not positive.
    #[error("invalid price: {0}")]
    Price(#[from] PriceError),

    /// The quantity is missing, fractional or not positive.
    #[error("invalid quantity: {0}")]
    Quantity(String),
}

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product identifier, unique within the cart
    pub id: String,

    /// Display name
    pub name: String,

    /// Unit price
    pub price: Price,

    /// Units in the cart, always at least one
    pub qty: u32,

    /// Image path or URL
    #[serde(default = "fallback_image")]
    pub image: String,

    /// Brand, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
}

fn fallback_image() -> String {
    FALLBACK_IMAGE.to_string()
}

impl CartLine {
    /// Unit price multiplied by quantity.
    pub fn line_total(&self) -> Price {
        self.price.times(self.qty)
    }

    /// Reads a persisted line, rejecting anything structurally invalid.
    ///
    /// Identifiers are trimmed and numeric ones stringified; a missing image falls
    /// back to [`FALLBACK_IMAGE`].
    ///
    /// # Errors
    ///
    /// Returns a [`LineError`] naming the first invalid field.
    pub fn from_stored(value: &Value) -> Result<Self, LineError> {
        let Value::Object(fields) = value else {
            return Err(LineError::NotAnObject);
        };

        let id = match fields.get("id") {
            Some(Value::String(id)) if !id.trim().is_empty() => id.trim().to_string(),
            Some(Value::Number(id)) => id.to_string(),
            _ => return Err(LineError::MissingId),
        };

        let name = match fields.get("name") {
            Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
            _ => return Err(LineError::MissingName(id)),
        };

        let price = fields
            .get("price")
            .map_or(Err(PriceError::Invalid("missing".to_string())), Price::from_json)?
            .require_positive()?;

        let qty = fields
            .get("qty")
            .ok_or_else(|| LineError::Quantity("missing".to_string()))
            .and_then(stored_quantity)?;

        let image = match fields.get("image") {
            Some(Value::String(image)) if !image.is_empty() => image.clone(),
            _ => FALLBACK_IMAGE.to_string(),
        };

        let brand = match fields.get("brand") {
            Some(Value::String(brand)) if !brand.is_empty() => Some(brand.clone()),
            _ => None,
        };

        Ok(Self {
            id,
            name,
            price,
            qty,
            image,
            brand,
        })
    }
}

fn stored_quantity(value: &Value) -> Result<u32, LineError> {
    let invalid = || LineError::Quantity(value.to_string());

    let qty = match value {
        Value::Number(number) => match number.as_u64() {
            Some(whole) => whole,
            None => {
                let amount = number
                    .as_f64()
                    .and_then(Decimal::from_f64)
                    .ok_or_else(invalid)?;

                if !amount.is_integer() {
                    return Err(invalid());
                }

                amount.to_u64().ok_or_else(invalid)?
            }
        },
        Value::String(text) => text.trim().parse().map_err(|_err| invalid())?,
        _ => return Err(invalid()),
    };

    match u32::try_from(qty) {
        Ok(qty) if qty > 0 => Ok(qty),
        _ => Err(invalid()),
    }
}

/// An item offered to the cart.
///
/// Only the identifier and price are validated. The remaining fields are
/// cosmetic and are defaulted when absent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewCartItem {
    /// Product identifier
    pub id: String,

    /// Display name, defaults to [`UNKNOWN_PRODUCT`]
    #[serde(default)]
    pub name: Option<String>,

    /// Unit price in major units
    pub price: f64,

    /// Units to add, defaults to one when absent or below one
    #[serde(default)]
    pub qty: Option<i64>,

    /// Image path, defaults to [`FALLBACK_IMAGE`]
    #[serde(default)]
    pub image: Option<String>,

    /// Brand
    #[serde(default)]
    pub brand: Option<String>,
}

impl NewCartItem {
    /// Creates an item with only the required fields set.
    pub fn new(id: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            name: None,
            price,
            qty: None,
            image: None,
            brand: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the quantity to add.
    #[must_use]
    pub fn qty(mut self, qty: i64) -> Self {
        self.qty = Some(qty);
        self
    }

    /// Sets the image path.
    #[must_use]
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Sets the brand.
    #[must_use]
    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Validates identity fields and fills in cosmetic defaults.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::MissingId`] for a blank id and
    /// [`LineError::Price`] for a non-finite or non-positive price.
    pub fn into_line(self) -> Result<CartLine, LineError> {
        let id = self.id.trim();

        if id.is_empty() {
            return Err(LineError::MissingId);
        }

        let price = Price::from_f64(self.price)?.require_positive()?;

        let qty = match self.qty {
            Some(qty) if qty >= 1 => u32::try_from(qty).unwrap_or(u32::MAX),
            _ => 1,
        };

        Ok(CartLine {
            id: id.to_string(),
            name: non_blank(self.name).unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
            price,
            qty,
            image: non_blank(self.image).unwrap_or_else(|| FALLBACK_IMAGE.to_string()),
            brand: non_blank(self.brand),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn into_line_fills_cosmetic_defaults() -> TestResult {
        let line = NewCartItem::new("rolex-submariner", 12_500.0).into_line()?;

        assert_eq!(line.name, UNKNOWN_PRODUCT);
        assert_eq!(line.image, FALLBACK_IMAGE);
        assert_eq!(line.qty, 1);
        assert_eq!(line.price, Price::from_major(12_500));
        assert_eq!(line.brand, None);

        Ok(())
    }

    #[test]
    fn into_line_clamps_small_quantities_to_one() -> TestResult {
        assert_eq!(NewCartItem::new("a", 1.0).qty(0).into_line()?.qty, 1);
        assert_eq!(NewCartItem::new("a", 1.0).qty(-4).into_line()?.qty, 1);
        assert_eq!(NewCartItem::new("a", 1.0).qty(3).into_line()?.qty, 3);

        Ok(())
    }

    #[test]
    fn into_line_rejects_blank_id_and_bad_prices() {
        assert_eq!(
            NewCartItem::new("  ", 10.0).into_line(),
            Err(LineError::MissingId)
        );
        assert_eq!(
            NewCartItem::new("a", f64::NAN).into_line(),
            Err(LineError::Price(PriceError::NotFinite))
        );
        assert!(matches!(
            NewCartItem::new("a", 0.0).into_line(),
            Err(LineError::Price(PriceError::NotPositive(_)))
        ));
    }

    #[test]
    fn from_stored_accepts_loose_numbers() -> TestResult {
        let line = CartLine::from_stored(&json!({
            "id": 7,
            "name": "Speedmaster",
            "price": "8900",
            "qty": 2.0,
        }))?;

        assert_eq!(line.id, "7");
        assert_eq!(line.price, Price::from_major(8_900));
        assert_eq!(line.qty, 2);
        assert_eq!(line.image, FALLBACK_IMAGE);

        Ok(())
    }

    #[test]
    fn from_stored_rejects_invalid_fields() {
        let rejected = [
            json!("not an object"),
            json!({"name": "x", "price": 1, "qty": 1}),
            json!({"id": "a", "price": 1, "qty": 1}),
            json!({"id": "a", "name": "x", "price": "abc", "qty": 1}),
            json!({"id": "a", "name": "x", "price": -5, "qty": 1}),
            json!({"id": "a", "name": "x", "price": 5, "qty": 0}),
            json!({"id": "a", "name": "x", "price": 5, "qty": 1.5}),
            json!({"id": "a", "name": "x", "price": 5}),
        ];

        for value in rejected {
            assert!(CartLine::from_stored(&value).is_err(), "accepted {value}");
        }
    }

    #[test]
    fn snapshot_without_image_decodes_with_fallback() -> TestResult {
        let line: CartLine = serde_json::from_value(json!({
            "id": "a",
            "name": "A",
            "price": 100,
            "qty": 1,
        }))?;

        assert_eq!(line.image, FALLBACK_IMAGE);

        Ok(())
    }

    #[test]
    fn line_total_multiplies_by_quantity() {
        let line = CartLine {
            id: "a".to_string(),
            name: "A".to_string(),
            price: Price::from_major(100),
            qty: 2,
            image: FALLBACK_IMAGE.to_string(),
            brand: None,
        };

        assert_eq!(line.line_total(), Price::from_major(200));
    }
}
