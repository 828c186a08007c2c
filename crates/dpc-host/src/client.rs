//! # Donation Host Client
//!
//! Reads the per-site campaign feed from the donation host and reports
//! donated quantities back. No caching, no retries: every call goes to the
//! host and every failure is final for that attempt.

use crate::config::HostConfig;
use async_trait::async_trait;
use dpc_core::{
    CampaignRecord, CampaignSource, ClientConfig, DeliveryChannel, FetchError, FetchResult,
    QuantityReport, ReconcileError, ReconcileResult, RequestContext,
};
use reqwest::Client;
use tracing::{debug, error, info, instrument, warn};

/// HTTP client for the donation host
#[derive(Debug, Clone)]
pub struct HostClient {
    client: Client,
}

impl HostClient {
    /// Create a new host client
    pub fn new(config: HostConfig) -> FetchResult<Self> {
        if config.accept_invalid_certs {
            warn!("TLS certificate verification is disabled for the donation host");
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| FetchError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Create from environment variables
    pub fn from_env() -> FetchResult<Self> {
        Self::new(HostConfig::from_env()?)
    }
}

#[async_trait]
impl CampaignSource for HostClient {
    #[instrument(skip(self, config, ctx), fields(site_id = %ctx.site_id()))]
    async fn fetch_campaign(
        &self,
        config: &ClientConfig,
        ctx: &RequestContext,
    ) -> FetchResult<CampaignRecord> {
        let url = config.campaign_url(&ctx.site_id())?;

        debug!("Fetching campaign feed: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", config.auth_header())
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !status.is_success() {
            error!("Campaign feed error: status={}, url={}", status, url);
            return Err(FetchError::HostRejected {
                status: status.as_u16(),
                message: format!("HTTP {}", status),
            });
        }

        let record = CampaignRecord::from_json(&body)?;

        info!(
            "Fetched campaign: name={}, required_quantity={}, archived={}",
            record.campaign_name, record.required_quantity, record.campaign_archive
        );

        Ok(record)
    }

    #[instrument(skip(self, config, report), fields(client_domain = %report.client_domain))]
    async fn report_quantity(
        &self,
        config: &ClientConfig,
        report: &QuantityReport,
    ) -> ReconcileResult<()> {
        config.validate()?;

        let url = config.update_quantity_url();

        let response = self
            .client
            .post(&url)
            .header("Authorization", config.auth_header())
            .json(report)
            .send()
            .await
            .map_err(|e| ReconcileError::delivery(DeliveryChannel::Webhook, e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            error!("update_quantity error: status={}, body={}", status, body);
            return Err(ReconcileError::delivery(
                DeliveryChannel::Webhook,
                format!("HTTP {}: {}", status, body),
            ));
        }

        info!(
            "Reported donation: campaign={}, quantity={}",
            report.campaign_name, report.donated_quantity
        );
        debug!("update_quantity response: {}", body);

        Ok(())
    }
}
