//! # Order Reconciliation
//!
//! Runs once when an order reaches the thank-you state: re-fetches the
//! campaign, reports the donated quantity to the host and notifies the host
//! operator. Delivery failures are logged and recorded in the outcome; they
//! never fail the order.

use dpc_core::{
    compose_notification, BoxedCampaignSource, BoxedLedger, BoxedNotifier, ClientConfig,
    CompletedOrder, OrderStatus, QuantityReport, ReconcileResult, RequestContext,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

/// Locale whose notification needs no language hints
pub const DEFAULT_LOCALE: &str = "en_US";

/// Result of a single delivery attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered,
    Failed { error: String },
}

impl DeliveryStatus {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered)
    }
}

/// What was reported for a completed order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DonationReport {
    pub order_id: String,
    pub campaign_name: String,
    pub donated_quantity: u32,
    /// `product_price * conversion_rate * donated_quantity`
    pub total_donation: Decimal,
    pub currency: String,
    pub webhook: DeliveryStatus,
    pub notification: DeliveryStatus,
}

/// Outcome of a reconcile call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Order has not reached the completed state
    NotCompleted,
    /// No donation item, or a non-positive quantity
    NoDonation,
    /// This order id was reported before
    AlreadyReported,
    Reported(DonationReport),
}

/// Reports completed donations to the host
pub struct Reconciler {
    source: BoxedCampaignSource,
    notifier: BoxedNotifier,
    ledger: BoxedLedger,
    locale: String,
}

impl Reconciler {
    pub fn new(source: BoxedCampaignSource, notifier: BoxedNotifier, ledger: BoxedLedger) -> Self {
        Self {
            source,
            notifier,
            ledger,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }

    /// Builder: operator locale for the notification template
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Reconcile a completed order.
    ///
    /// Returns an error only when the campaign cannot be re-fetched or the
    /// ledger fails; webhook and mail failures are captured in the report.
    #[instrument(skip(self, order, config, ctx), fields(order_id = %order.order_id))]
    pub async fn reconcile(
        &self,
        order: &CompletedOrder,
        config: &ClientConfig,
        ctx: &RequestContext,
    ) -> ReconcileResult<ReconcileOutcome> {
        if order.status != OrderStatus::Completed {
            debug!("Order not completed: status={:?}", order.status);
            return Ok(ReconcileOutcome::NotCompleted);
        }

        let meta = order.donation_meta();
        let quantity = match meta.quantity() {
            Some(q) => q,
            None => {
                debug!("No donation on order: {:?}", meta);
                return Ok(ReconcileOutcome::NoDonation);
            }
        };

        if self.ledger.is_reported(&order.order_id).await? {
            info!("Donation already reported, skipping");
            return Ok(ReconcileOutcome::AlreadyReported);
        }

        // Price and campaign name come from the host, never from the order
        let campaign = self.source.fetch_campaign(config, ctx).await.map_err(|e| {
            error!("Failed to re-fetch campaign for reconciliation: {}", e);
            e
        })?;

        if !self.ledger.claim(&order.order_id).await? {
            info!("Donation claimed concurrently, skipping");
            return Ok(ReconcileOutcome::AlreadyReported);
        }

        let site_id = ctx.site_id();
        let total_donation = campaign.donation_total(config.conversion_rate, quantity);

        let report = QuantityReport {
            client_domain: site_id.clone(),
            donated_quantity: quantity,
            campaign_name: campaign.campaign_name.clone(),
            required_quantity: campaign.required_quantity,
        };
        let webhook = match self.source.report_quantity(config, &report).await {
            Ok(()) => DeliveryStatus::Delivered,
            Err(e) => {
                error!("Failed to report donation to {}: {}", self.source.source_name(), e);
                DeliveryStatus::Failed {
                    error: e.to_string(),
                }
            }
        };

        let message =
            compose_notification(&site_id, &campaign, order, total_donation, &self.locale);
        let notification = match self.notifier.notify(&message).await {
            Ok(()) => DeliveryStatus::Delivered,
            Err(e) => {
                warn!("Failed to notify host operator: {}", e);
                DeliveryStatus::Failed {
                    error: e.to_string(),
                }
            }
        };

        info!(
            "Reconciled donation: campaign={}, quantity={}, total={} {}",
            campaign.campaign_name, quantity, total_donation, order.currency
        );

        Ok(ReconcileOutcome::Reported(DonationReport {
            order_id: order.order_id.clone(),
            campaign_name: campaign.campaign_name,
            donated_quantity: quantity,
            total_donation,
            currency: order.currency.clone(),
            webhook,
            notification,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HostClient;
    use crate::config::HostConfig;
    use crate::ledger::InMemoryLedger;
    use async_trait::async_trait;
    use dpc_core::order::{META_DONATION_FLAG, META_DONATION_QUANTITY};
    use dpc_core::site::{FIELD_ADD_DONATION, FIELD_DONATION_QUANTITY};
    use dpc_core::{
        donation_line_item, CampaignRecord, CampaignSource, Currency, DeliveryChannel,
        DonationNotifier, DonationOffer, DonationSelection, FetchError, FetchResult,
        NotificationMessage, OrderLineItem, ReconcileError,
    };
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FakeSource {
        campaign: FetchResult<CampaignRecord>,
        fail_report: bool,
        fetches: AtomicUsize,
        reports: Mutex<Vec<QuantityReport>>,
    }

    impl FakeSource {
        fn with(campaign: FetchResult<CampaignRecord>) -> Arc<Self> {
            Arc::new(Self {
                campaign,
                fail_report: false,
                fetches: AtomicUsize::new(0),
                reports: Mutex::new(Vec::new()),
            })
        }

        fn outbound_calls(&self) -> usize {
            self.fetches.load(Ordering::SeqCst) + self.reports.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CampaignSource for FakeSource {
        async fn fetch_campaign(
            &self,
            config: &ClientConfig,
            _ctx: &RequestContext,
        ) -> FetchResult<CampaignRecord> {
            config.validate()?;
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.campaign.clone()
        }

        async fn report_quantity(
            &self,
            _config: &ClientConfig,
            report: &QuantityReport,
        ) -> ReconcileResult<()> {
            self.reports.lock().unwrap().push(report.clone());
            if self.fail_report {
                return Err(ReconcileError::delivery(DeliveryChannel::Webhook, "refused"));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<NotificationMessage>>,
    }

    #[async_trait]
    impl DonationNotifier for RecordingNotifier {
        async fn notify(&self, message: &NotificationMessage) -> ReconcileResult<()> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn books() -> CampaignRecord {
        CampaignRecord {
            campaign_name: "Books".to_string(),
            product_id: "77".to_string(),
            product_price: dec!(10),
            required_quantity: 3,
            campaign_archive: false,
            host_checkout_page: "https://host.example/?add-to-cart=".to_string(),
            host_email: "host@host.example".to_string(),
        }
    }

    fn config() -> ClientConfig {
        ClientConfig::new("https://host.example", "aaa.bbb.ccccccccXXXX")
            .with_conversion_rate(dec!(2))
    }

    fn ctx() -> RequestContext {
        RequestContext::new("shop.example.com")
    }

    fn donated_order(quantity: &str) -> CompletedOrder {
        CompletedOrder::new("1001", "USD")
            .with_billing("Ana", "Petrova", "ana@example.com")
            .with_item(
                OrderLineItem::new("500", "Books", 2, dec!(40))
                    .with_meta(META_DONATION_FLAG, "yes")
                    .with_meta(META_DONATION_QUANTITY, quantity),
            )
    }

    fn reconciler(
        source: Arc<FakeSource>,
        notifier: Arc<RecordingNotifier>,
    ) -> Reconciler {
        Reconciler::new(source, notifier, Arc::new(InMemoryLedger::new()))
    }

    #[tokio::test]
    async fn test_reports_and_notifies() {
        let source = FakeSource::with(Ok(books()));
        let notifier = Arc::new(RecordingNotifier::default());
        let reconciler = reconciler(source.clone(), notifier.clone());

        let outcome = reconciler
            .reconcile(&donated_order("2"), &config(), &ctx())
            .await
            .unwrap();

        let report = match outcome {
            ReconcileOutcome::Reported(report) => report,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(report.total_donation, dec!(40));
        assert_eq!(report.donated_quantity, 2);
        assert!(report.webhook.is_delivered());
        assert!(report.notification.is_delivered());

        let reports = source.reports.lock().unwrap();
        assert_eq!(
            reports[0],
            QuantityReport {
                client_domain: "shop_example_com".to_string(),
                donated_quantity: 2,
                campaign_name: "Books".to_string(),
                required_quantity: 3,
            }
        );

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent[0].to, "host@host.example");
        assert_eq!(sent[0].subject, "shop_example_com: Books");
        assert!(sent[0].body.contains("Donation: 40 USD"));
    }

    #[tokio::test]
    async fn test_no_donation_makes_no_calls() {
        let source = FakeSource::with(Ok(books()));
        let notifier = Arc::new(RecordingNotifier::default());
        let reconciler = reconciler(source.clone(), notifier.clone());

        let plain = CompletedOrder::new("1002", "USD")
            .with_item(OrderLineItem::new("5", "Shirt", 1, dec!(15)));
        assert_eq!(
            reconciler.reconcile(&plain, &config(), &ctx()).await.unwrap(),
            ReconcileOutcome::NoDonation
        );

        assert_eq!(
            reconciler
                .reconcile(&donated_order("0"), &config(), &ctx())
                .await
                .unwrap(),
            ReconcileOutcome::NoDonation
        );

        assert_eq!(source.outbound_calls(), 0);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_completion_is_skipped() {
        let source = FakeSource::with(Ok(books()));
        let notifier = Arc::new(RecordingNotifier::default());
        let reconciler = reconciler(source.clone(), notifier.clone());
        let order = donated_order("1");

        reconciler.reconcile(&order, &config(), &ctx()).await.unwrap();
        let calls_after_first = source.outbound_calls();

        let second = reconciler.reconcile(&order, &config(), &ctx()).await.unwrap();
        assert_eq!(second, ReconcileOutcome::AlreadyReported);
        assert_eq!(source.outbound_calls(), calls_after_first);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_not_completed_order_is_skipped() {
        let source = FakeSource::with(Ok(books()));
        let reconciler = reconciler(source.clone(), Arc::new(RecordingNotifier::default()));

        let mut order = donated_order("2");
        order.status = OrderStatus::Paid;
        assert_eq!(
            reconciler.reconcile(&order, &config(), &ctx()).await.unwrap(),
            ReconcileOutcome::NotCompleted
        );
        assert_eq!(source.outbound_calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_returned_and_order_not_claimed() {
        let source = FakeSource::with(Err(FetchError::Transport("dns".to_string())));
        let ledger = Arc::new(InMemoryLedger::new());
        let reconciler = Reconciler::new(
            source.clone(),
            Arc::new(RecordingNotifier::default()),
            ledger.clone(),
        );

        let err = reconciler
            .reconcile(&donated_order("2"), &config(), &ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Fetch(FetchError::Transport(_))));
        assert!(!dpc_core::ReportLedger::is_reported(ledger.as_ref(), "1001")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_webhook_failure_still_notifies() {
        let source = Arc::new(FakeSource {
            campaign: Ok(books()),
            fail_report: true,
            fetches: AtomicUsize::new(0),
            reports: Mutex::new(Vec::new()),
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let reconciler = reconciler(source, notifier.clone());

        let outcome = reconciler
            .reconcile(&donated_order("2"), &config(), &ctx())
            .await
            .unwrap();
        match outcome {
            ReconcileOutcome::Reported(report) => {
                assert!(!report.webhook.is_delivered());
                assert!(report.notification.is_delivered());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_locale_hints() {
        let source = FakeSource::with(Ok(books()));
        let notifier = Arc::new(RecordingNotifier::default());
        let reconciler = reconciler(source, notifier.clone()).with_locale("mk_MK");

        reconciler
            .reconcile(&donated_order("1"), &config(), &ctx())
            .await
            .unwrap();
        let sent = notifier.sent.lock().unwrap();
        assert!(sent[0].body.contains("Donation: 20 USD (Donation)"));
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(ReconcileOutcome::NoDonation).unwrap();
        assert_eq!(json, json!({"outcome": "no_donation"}));

        let failed = serde_json::to_value(DeliveryStatus::Failed {
            error: "x".to_string(),
        })
        .unwrap();
        assert_eq!(failed, json!({"status": "failed", "error": "x"}));
    }

    /// Checkout through completion against a mocked host
    #[tokio::test]
    async fn test_end_to_end_books_campaign() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/wp-content/plugins/donate-product-host/campaigns/shop_example_com_cccccccc.json",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "campaign_archive": 0,
                "product_price": 10,
                "required_quantity": 3,
                "campaign_name": "Books",
                "product_id": "77",
                "host_email": "host@host.example"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/wp-json/donate-product-host/v1/update_quantity"))
            .and(body_json(json!({
                "client_domain": "shop_example_com",
                "donated_quantity": 2,
                "campaign_name": "Books",
                "required_quantity": 3
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let host = Arc::new(HostClient::new(HostConfig::default()).unwrap());
        let config = ClientConfig::new(server.uri(), "aaa.bbb.ccccccccXXXX")
            .with_conversion_rate(dec!(2));

        // Checkout render
        let record = host.fetch_campaign(&config, &ctx()).await.unwrap();
        let offer = DonationOffer::from_campaign(&record, config.conversion_rate, Currency::USD)
            .unwrap();
        assert_eq!(offer.max_quantity, 3);
        assert_eq!(offer.unit_price.amount, dec!(20));

        // Order creation with quantity 2
        let submitted = ctx()
            .with_field(FIELD_ADD_DONATION, "77")
            .with_field(FIELD_DONATION_QUANTITY, "2");
        let selection = DonationSelection::from_fields(&submitted, &offer);
        let item = donation_line_item(&offer, &selection, "500").unwrap();
        assert_eq!(item.total, dec!(40));

        // Completion
        let order = CompletedOrder::new("1001", "USD")
            .with_billing("Ana", "Petrova", "ana@example.com")
            .with_item(item);
        let reconciler = Reconciler::new(
            host,
            Arc::new(RecordingNotifier::default()),
            Arc::new(InMemoryLedger::new()),
        );
        let outcome = reconciler.reconcile(&order, &config, &ctx()).await.unwrap();
        match outcome {
            ReconcileOutcome::Reported(report) => {
                assert_eq!(report.total_donation, dec!(40));
                assert!(report.webhook.is_delivered());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
