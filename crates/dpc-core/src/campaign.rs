//! # Campaign Records
//!
//! The campaign feed published by the donation host, one JSON file per
//! client site. Records are transient: fetched fresh for every request and
//! never cached.
//!
//! The host writes the feed loosely typed, so numbers may arrive as strings
//! and flags as `0`/`1`. Decoding goes through [`RawCampaign`] and is
//! normalized in `TryFrom`.

use crate::error::FetchError;
use crate::price::{Currency, Price};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// A donation campaign as published by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignRecord {
    pub campaign_name: String,
    pub product_id: String,
    /// Unit price in the host's currency
    pub product_price: Decimal,
    pub required_quantity: u32,
    pub campaign_archive: bool,
    /// Prefix of the host checkout link; `product_id` is appended
    pub host_checkout_page: String,
    pub host_email: String,
}

impl CampaignRecord {
    /// Decode a feed body
    pub fn from_json(body: &str) -> Result<Self, FetchError> {
        let raw: RawCampaign = serde_json::from_str(body)
            .map_err(|e| FetchError::Parse(format!("Failed to parse campaign feed: {}", e)))?;
        Self::try_from(raw)
    }

    /// Archived or fully funded campaigns are not offered at checkout
    pub fn is_active(&self) -> bool {
        !self.campaign_archive && self.required_quantity > 0
    }

    /// Unit price converted to the local currency
    pub fn unit_price(&self, conversion_rate: Decimal, currency: Currency) -> Price {
        Price::new(self.product_price * conversion_rate, currency)
    }

    /// Total donation for a quantity: `product_price * rate * quantity`
    pub fn donation_total(&self, conversion_rate: Decimal, quantity: u32) -> Decimal {
        self.product_price * conversion_rate * Decimal::from(quantity)
    }

    /// Link to the host's checkout for this campaign's product
    pub fn donation_link(&self) -> String {
        format!("{}{}", self.host_checkout_page, self.product_id)
    }
}

/// Wire shape of the feed, before normalization
#[derive(Debug, Deserialize)]
pub struct RawCampaign {
    #[serde(default)]
    campaign_name: Option<Value>,
    #[serde(default)]
    product_id: Option<Value>,
    #[serde(default)]
    product_price: Option<Value>,
    #[serde(default)]
    required_quantity: Option<Value>,
    #[serde(default)]
    campaign_archive: Option<Value>,
    #[serde(default)]
    host_checkout_page: Option<Value>,
    #[serde(default)]
    host_email: Option<Value>,
}

impl TryFrom<RawCampaign> for CampaignRecord {
    type Error = FetchError;

    fn try_from(raw: RawCampaign) -> Result<Self, Self::Error> {
        let campaign_name = required_text("campaign_name", raw.campaign_name)?;
        let product_id = required_text("product_id", raw.product_id)?;

        let product_price = match raw.product_price {
            Some(v) if !v.is_null() => decimal_value(&v)
                .ok_or_else(|| FetchError::Parse(format!("Invalid product_price: {}", v)))?,
            _ => return Err(missing("product_price")),
        };
        if product_price.is_sign_negative() {
            return Err(FetchError::Parse(format!(
                "Negative product_price: {}",
                product_price
            )));
        }

        let required_quantity = match raw.required_quantity {
            Some(v) if !v.is_null() => quantity_value(&v)
                .ok_or_else(|| FetchError::Parse(format!("Invalid required_quantity: {}", v)))?,
            _ => 0,
        };

        let campaign_archive = match raw.campaign_archive {
            Some(v) => flag_value(&v)
                .ok_or_else(|| FetchError::Parse(format!("Invalid campaign_archive: {}", v)))?,
            None => false,
        };

        Ok(Self {
            campaign_name,
            product_id,
            product_price,
            required_quantity,
            campaign_archive,
            host_checkout_page: optional_text(raw.host_checkout_page),
            host_email: optional_text(raw.host_email),
        })
    }
}

fn missing(field: &str) -> FetchError {
    FetchError::Parse(format!("Missing field: {}", field))
}

fn text_value(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_text(field: &str, v: Option<Value>) -> Result<String, FetchError> {
    match v {
        Some(Value::Null) | None => Err(missing(field)),
        Some(v) => text_value(&v)
            .ok_or_else(|| FetchError::Parse(format!("Invalid {}: {}", field, v))),
    }
}

fn optional_text(v: Option<Value>) -> String {
    v.as_ref().and_then(text_value).unwrap_or_default()
}

fn decimal_value(v: &Value) -> Option<Decimal> {
    let s = text_value(v)?;
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Quantities are integers; "3", 3 and 3.0 are accepted, negatives floor to 0
fn quantity_value(v: &Value) -> Option<u32> {
    let d = decimal_value(v)?;
    if d.is_sign_negative() {
        return Some(0);
    }
    d.trunc().to_u32()
}

fn flag_value(v: &Value) -> Option<bool> {
    match v {
        Value::Null => Some(false),
        Value::Bool(b) => Some(*b),
        Value::Number(_) => decimal_value(v).map(|d| !d.is_zero()),
        Value::String(s) => match s.trim() {
            "" | "0" | "false" => Some(false),
            "1" | "true" => Some(true),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const BOOKS: &str = r#"{
        "campaign_name": "Books",
        "product_id": 77,
        "product_price": 10,
        "required_quantity": 3,
        "campaign_archive": 0,
        "host_checkout_page": "https://host.example/checkout/?add-to-cart=",
        "host_email": "host@host.example"
    }"#;

    #[test]
    fn test_parse_numeric_feed() {
        let record = CampaignRecord::from_json(BOOKS).unwrap();
        assert_eq!(record.campaign_name, "Books");
        assert_eq!(record.product_id, "77");
        assert_eq!(record.product_price, dec!(10));
        assert_eq!(record.required_quantity, 3);
        assert!(!record.campaign_archive);
        assert!(record.is_active());
        assert_eq!(
            record.donation_link(),
            "https://host.example/checkout/?add-to-cart=77"
        );
    }

    #[test]
    fn test_parse_stringly_typed_feed() {
        let record = CampaignRecord::from_json(
            r#"{"campaign_name":"Pens","product_id":"p-1","product_price":"2.50",
                "required_quantity":"5","campaign_archive":"1"}"#,
        )
        .unwrap();
        assert_eq!(record.product_price, dec!(2.50));
        assert_eq!(record.required_quantity, 5);
        assert!(record.campaign_archive);
        assert!(!record.is_active());
        assert_eq!(record.host_email, "");
    }

    #[test]
    fn test_missing_required_quantity_is_inactive() {
        let record = CampaignRecord::from_json(
            r#"{"campaign_name":"Pens","product_id":"1","product_price":1}"#,
        )
        .unwrap();
        assert_eq!(record.required_quantity, 0);
        assert!(!record.is_active());
    }

    #[test]
    fn test_boolean_archive_flag() {
        let record = CampaignRecord::from_json(
            r#"{"campaign_name":"Pens","product_id":"1","product_price":1,
                "required_quantity":2,"campaign_archive":true}"#,
        )
        .unwrap();
        assert!(record.campaign_archive);
    }

    #[test]
    fn test_malformed_bodies() {
        assert!(matches!(
            CampaignRecord::from_json("<html>Not Found</html>"),
            Err(FetchError::Parse(_))
        ));
        assert!(matches!(
            CampaignRecord::from_json("null"),
            Err(FetchError::Parse(_))
        ));
        assert!(matches!(
            CampaignRecord::from_json(r#"{"campaign_name":"x","product_id":"1"}"#),
            Err(FetchError::Parse(_))
        ));
        assert!(matches!(
            CampaignRecord::from_json(
                r#"{"campaign_name":"x","product_id":"1","product_price":"ten"}"#
            ),
            Err(FetchError::Parse(_))
        ));
    }

    #[test]
    fn test_prices_follow_conversion_rate() {
        let record = CampaignRecord::from_json(BOOKS).unwrap();
        let unit = record.unit_price(dec!(2), Currency::USD);
        assert_eq!(unit.amount, dec!(20));
        assert_eq!(record.donation_total(dec!(2), 2), dec!(40));
        assert_eq!(record.donation_total(dec!(61.4), 1), dec!(614.0));
    }
}
