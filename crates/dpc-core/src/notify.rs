//! # Host Notification
//!
//! Composes the message sent to the host operator when a donation is
//! completed. Non-English locales get the English label appended to each
//! line so the host can read it either way.

use crate::campaign::CampaignRecord;
use crate::order::CompletedOrder;
use crate::price::plain_amount;
use crate::source::NotificationMessage;
use rust_decimal::Decimal;

/// Whether a locale uses the plain English template
pub fn is_english(locale: &str) -> bool {
    matches!(locale, "en_US" | "en-US")
}

/// Build the notification for a reconciled donation
pub fn compose_notification(
    site_id: &str,
    campaign: &CampaignRecord,
    order: &CompletedOrder,
    total_donation: Decimal,
    locale: &str,
) -> NotificationMessage {
    let lines = [
        (format!("Order ID: {}", order.order_number), " (Order ID)"),
        (
            format!("Donation: {} {}", plain_amount(total_donation), order.currency),
            " (Donation)",
        ),
        (format!("Donor Name: {}", order.donor_name()), " (Donor name)"),
        (format!("Donor Email: {}", order.billing_email), " (Donor Email)"),
    ];

    let english = is_english(locale);
    let body = lines
        .iter()
        .map(|(line, hint)| {
            if english {
                line.clone()
            } else {
                format!("{}{}", line, hint)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    NotificationMessage {
        to: campaign.host_email.trim().to_string(),
        subject: format!("{}: {}", site_id, campaign.campaign_name),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn campaign() -> CampaignRecord {
        CampaignRecord {
            campaign_name: "Books".to_string(),
            product_id: "77".to_string(),
            product_price: dec!(10),
            required_quantity: 3,
            campaign_archive: false,
            host_checkout_page: String::new(),
            host_email: " host@host.example ".to_string(),
        }
    }

    fn order() -> CompletedOrder {
        let mut order = CompletedOrder::new("1001", "USD").with_billing(
            "Ana",
            "Petrova",
            "ana@example.com",
        );
        order.order_number = "#1001".to_string();
        order
    }

    #[test]
    fn test_english_template() {
        let msg = compose_notification("shop_example_com", &campaign(), &order(), dec!(40.00), "en_US");
        assert_eq!(msg.to, "host@host.example");
        assert_eq!(msg.subject, "shop_example_com: Books");
        assert_eq!(
            msg.body,
            "Order ID: #1001\nDonation: 40 USD\nDonor Name: Ana Petrova\nDonor Email: ana@example.com"
        );
    }

    #[test]
    fn test_other_locale_appends_hints() {
        let msg = compose_notification("shop_example_com", &campaign(), &order(), dec!(12.5), "mk_MK");
        assert_eq!(
            msg.body,
            "Order ID: #1001 (Order ID)\nDonation: 12.5 USD (Donation)\nDonor Name: Ana Petrova (Donor name)\nDonor Email: ana@example.com (Donor Email)"
        );
    }

    #[test]
    fn test_is_english() {
        assert!(is_english("en_US"));
        assert!(is_english("en-US"));
        assert!(!is_english("en_GB"));
        assert!(!is_english("mk_MK"));
    }
}
