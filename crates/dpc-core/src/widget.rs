//! # Donation Button Widget
//!
//! Markup for the `[dpc_donation_button]` directive: a call-to-action link to
//! the host checkout, for sites that do not run a checkout of their own.

use crate::campaign::CampaignRecord;
use crate::checkout::escape_html;

const DONATE_NOW: &str = "Donate Now";
const NO_ACTIVE_CAMPAIGN: &str = "No active campaign.";

/// Render the button for a fetched campaign, or the fallback text.
///
/// Only the archive flag gates the link; a campaign with no remaining
/// quantity still links to the host.
pub fn render_donation_button(campaign: Option<&CampaignRecord>) -> String {
    match campaign {
        Some(record) if !record.campaign_archive => format!(
            r#"<a href="{}" class="button">{}</a>"#,
            escape_html(&record.donation_link()),
            DONATE_NOW
        ),
        _ => NO_ACTIVE_CAMPAIGN.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(archived: bool) -> CampaignRecord {
        CampaignRecord {
            campaign_name: "Books".to_string(),
            product_id: "77".to_string(),
            product_price: dec!(10),
            required_quantity: 3,
            campaign_archive: archived,
            host_checkout_page: "https://host.example/checkout/?add-to-cart=".to_string(),
            host_email: String::new(),
        }
    }

    #[test]
    fn test_button_links_to_host_checkout() {
        let html = render_donation_button(Some(&record(false)));
        assert_eq!(
            html,
            r#"<a href="https://host.example/checkout/?add-to-cart=77" class="button">Donate Now</a>"#
        );
    }

    #[test]
    fn test_fallback_text() {
        assert_eq!(render_donation_button(Some(&record(true))), "No active campaign.");
        assert_eq!(render_donation_button(None), "No active campaign.");
    }
}
