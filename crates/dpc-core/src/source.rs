//! # Collaborator Traits
//!
//! Seams between the reconciliation flow and the outside world.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       Reconciler                         │
//! └──────────────────────────────────────────────────────────┘
//!        │                    │                     │
//!        ▼                    ▼                     ▼
//! ┌───────────────┐  ┌──────────────────┐  ┌────────────────┐
//! │CampaignSource │  │ DonationNotifier │  │  ReportLedger  │
//! │ fetch/report  │  │  host operator   │  │ at-most-once   │
//! └───────────────┘  └──────────────────┘  └────────────────┘
//!        ▲                    ▲                     ▲
//!    HostClient       HttpMailRelay /        InMemoryLedger /
//!                     LoggingNotifier        FileLedger
//! ```

use crate::campaign::CampaignRecord;
use crate::config::ClientConfig;
use crate::error::{FetchResult, ReconcileResult};
use crate::site::RequestContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of the `update_quantity` webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityReport {
    pub client_domain: String,
    pub donated_quantity: u32,
    pub campaign_name: String,
    pub required_quantity: u32,
}

/// Where campaign data comes from and where donations are reported to.
#[async_trait]
pub trait CampaignSource: Send + Sync {
    /// Fetch the campaign published for this site.
    ///
    /// Fails with `FetchError::Config` before any network call when the
    /// host URL or client key is missing.
    async fn fetch_campaign(
        &self,
        config: &ClientConfig,
        ctx: &RequestContext,
    ) -> FetchResult<CampaignRecord>;

    /// Report a donated quantity to the host.
    async fn report_quantity(
        &self,
        config: &ClientConfig,
        report: &QuantityReport,
    ) -> ReconcileResult<()>;

    /// Source name (for logging)
    fn source_name(&self) -> &'static str {
        "host"
    }
}

/// Message sent to the host operator after a donation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers notification messages (mail transport).
#[async_trait]
pub trait DonationNotifier: Send + Sync {
    async fn notify(&self, message: &NotificationMessage) -> ReconcileResult<()>;
}

/// Remembers which orders were already reported.
#[async_trait]
pub trait ReportLedger: Send + Sync {
    /// Claim an order id. Returns `true` only for the first claim.
    async fn claim(&self, order_id: &str) -> ReconcileResult<bool>;

    /// Whether an order id was already claimed
    async fn is_reported(&self, order_id: &str) -> ReconcileResult<bool>;
}

pub type BoxedCampaignSource = Arc<dyn CampaignSource>;
pub type BoxedNotifier = Arc<dyn DonationNotifier>;
pub type BoxedLedger = Arc<dyn ReportLedger>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_report_wire_format() {
        let report = QuantityReport {
            client_domain: "shop_example_com".to_string(),
            donated_quantity: 2,
            campaign_name: "Books".to_string(),
            required_quantity: 3,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "client_domain": "shop_example_com",
                "donated_quantity": 2,
                "campaign_name": "Books",
                "required_quantity": 3
            })
        );
    }
}
