//! # Order Types
//!
//! Orders are owned by the commerce platform. These types describe the
//! parts the donation client reads and writes: line items carrying
//! donation metadata, and the completed order handed to reconciliation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Line-item meta key flagging the donation item
pub const META_DONATION_FLAG: &str = "_donation_product";

/// Line-item meta key holding the donated quantity
pub const META_DONATION_QUANTITY: &str = "_donation_product_quantity";

/// A line item on a platform order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    /// Platform product ID
    pub product_id: String,

    /// Display name
    pub name: String,

    pub quantity: u32,

    /// Line total in the order currency
    pub total: Decimal,

    /// Item metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, String>,
}

impl OrderLineItem {
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        quantity: u32,
        total: Decimal,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            quantity,
            total,
            meta: HashMap::new(),
        }
    }

    /// Builder: add metadata
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn is_donation(&self) -> bool {
        self.meta.get(META_DONATION_FLAG).map(|v| v.as_str()) == Some("yes")
    }
}

/// Donation metadata read off an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDonationMeta {
    /// `true` when an item carries `_donation_product = "yes"`
    pub donation_flag: bool,
    pub donated_quantity: i64,
}

impl OrderDonationMeta {
    /// Read the first donation item's metadata
    pub fn from_items(items: &[OrderLineItem]) -> Self {
        match items.iter().find(|item| item.is_donation()) {
            Some(item) => Self {
                donation_flag: true,
                donated_quantity: item
                    .meta
                    .get(META_DONATION_QUANTITY)
                    .and_then(|q| q.trim().parse::<i64>().ok())
                    .unwrap_or(0),
            },
            None => Self {
                donation_flag: false,
                donated_quantity: 0,
            },
        }
    }

    /// Only flagged orders with a positive quantity are reconciled
    pub fn is_reportable(&self) -> bool {
        self.donation_flag && self.donated_quantity > 0
    }

    /// Reportable quantity, if any
    pub fn quantity(&self) -> Option<u32> {
        if !self.is_reportable() {
            return None;
        }
        u32::try_from(self.donated_quantity).ok()
    }
}

/// Lifecycle states of a platform order, as seen by the donation client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order created, donation item attached if opted in
    Created,
    /// Payment captured
    Paid,
    /// Buyer reached the thank-you page; reconciliation runs once
    Completed,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Completed
    }
}

/// An order that reached the thank-you state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedOrder {
    /// Platform order ID (reconciliation key)
    pub order_id: String,

    /// Customer-facing order number
    #[serde(default)]
    pub order_number: String,

    #[serde(default)]
    pub status: OrderStatus,

    /// ISO currency code as reported by the platform
    pub currency: String,

    #[serde(default)]
    pub billing_first_name: String,

    #[serde(default)]
    pub billing_last_name: String,

    #[serde(default)]
    pub billing_email: String,

    #[serde(default)]
    pub items: Vec<OrderLineItem>,
}

impl CompletedOrder {
    pub fn new(order_id: impl Into<String>, currency: impl Into<String>) -> Self {
        let order_id: String = order_id.into();
        Self {
            order_number: order_id.clone(),
            order_id,
            status: OrderStatus::Completed,
            currency: currency.into(),
            billing_first_name: String::new(),
            billing_last_name: String::new(),
            billing_email: String::new(),
            items: Vec::new(),
        }
    }

    /// Builder: set billing details
    pub fn with_billing(
        mut self,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        self.billing_first_name = first_name.into();
        self.billing_last_name = last_name.into();
        self.billing_email = email.into();
        self
    }

    /// Builder: add a line item
    pub fn with_item(mut self, item: OrderLineItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn donation_meta(&self) -> OrderDonationMeta {
        OrderDonationMeta::from_items(&self.items)
    }

    pub fn donor_name(&self) -> String {
        format!("{} {}", self.billing_first_name, self.billing_last_name)
    }

    /// Order total across all line items
    pub fn total(&self) -> Decimal {
        self.items.iter().map(|item| item.total).sum()
    }
}
