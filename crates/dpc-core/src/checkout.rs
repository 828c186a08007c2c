//! # Checkout Presentation
//!
//! Turns a fetched campaign into what the checkout needs: the opt-in row,
//! the cart fee and the order line item. Everything here is pure; callers
//! pass `None` when no campaign could be fetched and get nothing back.

use crate::campaign::CampaignRecord;
use crate::order::{OrderLineItem, META_DONATION_FLAG, META_DONATION_QUANTITY};
use crate::price::{Currency, Price};
use crate::site::{RequestContext, FIELD_ADD_DONATION, FIELD_DONATION_QUANTITY};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Label of the cart fee
pub const DONATION_FEE_LABEL: &str = "Donation";

/// A donation the checkout can offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationOffer {
    pub campaign_name: String,
    pub product_id: String,
    /// `product_price * conversion_rate`
    pub unit_price: Price,
    /// Upper bound of the quantity selector (lower bound is 1)
    pub max_quantity: u32,
}

impl DonationOffer {
    /// Build an offer for active campaigns only
    pub fn from_campaign(
        record: &CampaignRecord,
        conversion_rate: Decimal,
        currency: Currency,
    ) -> Option<Self> {
        if !record.is_active() {
            return None;
        }
        Some(Self {
            campaign_name: record.campaign_name.clone(),
            product_id: record.product_id.clone(),
            unit_price: record.unit_price(conversion_rate, currency),
            max_quantity: record.required_quantity,
        })
    }

    /// Render the `<tr>` placed above the order total
    pub fn render_row(&self) -> String {
        format!(
            r#"<tr class="donation_product">
    <th>{name}</th>
    <td>
        <input type="checkbox" id="add_donation_product" name="{checkbox}" value="{product_id}" data-price="{price}">
        <input type="number" id="donation_product_quantity" name="{quantity}" min="1" max="{max}" value="1" style="width: 60px; margin-left: 10px;" disabled>
        {display}
    </td>
</tr>"#,
            name = escape_html(&self.campaign_name),
            checkbox = FIELD_ADD_DONATION,
            product_id = escape_html(&self.product_id),
            price = self.unit_price.amount,
            quantity = FIELD_DONATION_QUANTITY,
            max = self.max_quantity,
            display = escape_html(&self.unit_price.display()),
        )
    }
}

/// The buyer's donation choice at checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationSelection {
    pub selected: bool,
    /// Always within `1..=max_quantity` of the offer
    pub quantity: u32,
}

impl DonationSelection {
    /// Read the submitted checkout fields.
    ///
    /// A non-empty checkbox value means opted in. The quantity defaults to 1
    /// and is clamped into the offer's bounds.
    pub fn from_fields(ctx: &RequestContext, offer: &DonationOffer) -> Self {
        let selected = ctx
            .field(FIELD_ADD_DONATION)
            .map(|v| !v.trim().is_empty() && v.trim() != "0")
            .unwrap_or(false);

        let requested = match ctx.field(FIELD_DONATION_QUANTITY) {
            Some(raw) => raw.trim().parse::<i64>().unwrap_or(0),
            None => 1,
        };
        let max = i64::from(offer.max_quantity.max(1));
        let quantity = requested.clamp(1, max) as u32;

        Self { selected, quantity }
    }
}

/// A fee added to the cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub label: String,
    pub amount: Price,
}

/// Cart fee for a selected donation
pub fn donation_fee(offer: &DonationOffer, selection: &DonationSelection) -> Option<Fee> {
    if !selection.selected {
        return None;
    }
    Some(Fee {
        label: DONATION_FEE_LABEL.to_string(),
        amount: offer.unit_price.times(selection.quantity),
    })
}

/// Line item attached to the order at creation time
pub fn donation_line_item(
    offer: &DonationOffer,
    selection: &DonationSelection,
    virtual_product_id: &str,
) -> Option<OrderLineItem> {
    if !selection.selected {
        return None;
    }
    let total = offer.unit_price.times(selection.quantity).amount;
    Some(
        OrderLineItem::new(
            virtual_product_id,
            offer.campaign_name.clone(),
            selection.quantity,
            total,
        )
        .with_meta(META_DONATION_FLAG, "yes")
        .with_meta(META_DONATION_QUANTITY, selection.quantity.to_string()),
    )
}

/// Minimal HTML escaping for text and attribute values
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}
