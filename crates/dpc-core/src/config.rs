//! # Client Configuration
//!
//! Per-request configuration for talking to the donation host.
//! A `ClientConfig` is loaded once from operator settings and passed
//! explicitly into every fetch and reconcile call.

use crate::error::{FetchError, FetchResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fixed path on the host where per-site campaign feeds are published
pub const CAMPAIGN_FEED_PATH: &str = "/wp-content/plugins/donate-product-host/campaigns";

/// Fixed host endpoint that receives donated quantities
pub const UPDATE_QUANTITY_PATH: &str = "/wp-json/donate-product-host/v1/update_quantity";

/// Number of signature characters used in the feed file name
const KEY_SUFFIX_LEN: usize = 8;

/// Configuration supplied by the site operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Host base URL, without trailing slash (e.g. "https://host.example")
    pub host_url: String,

    /// Three-segment bearer credential issued by the host
    pub client_key: String,

    /// Multiplier from host price to local currency
    #[serde(default = "default_rate")]
    pub conversion_rate: Decimal,
}

fn default_rate() -> Decimal {
    Decimal::ONE
}

impl ClientConfig {
    pub fn new(host_url: impl Into<String>, client_key: impl Into<String>) -> Self {
        let host_url: String = host_url.into();
        Self {
            host_url: host_url.trim().trim_end_matches('/').to_string(),
            client_key: client_key.into().trim().to_string(),
            conversion_rate: Decimal::ONE,
        }
    }

    /// Builder: set conversion rate
    pub fn with_conversion_rate(mut self, rate: Decimal) -> Self {
        self.conversion_rate = rate;
        self
    }

    /// Check preconditions shared by every outbound call
    pub fn validate(&self) -> FetchResult<()> {
        if self.host_url.is_empty() || self.client_key.is_empty() {
            return Err(FetchError::Config(
                "Host URL or Client Key is missing.".to_string(),
            ));
        }
        if self.conversion_rate.is_sign_negative() {
            return Err(FetchError::Config(format!(
                "Conversion rate must not be negative: {}",
                self.conversion_rate
            )));
        }
        Ok(())
    }

    /// Parsed view of the client key
    pub fn key(&self) -> FetchResult<ClientKey<'_>> {
        ClientKey::parse(&self.client_key)
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.client_key)
    }

    /// Campaign feed URL for the given site id
    pub fn campaign_url(&self, site_id: &str) -> FetchResult<String> {
        self.validate()?;
        let suffix = self.key()?.suffix();
        Ok(format!(
            "{}{}/{}_{}.json",
            self.host_url, CAMPAIGN_FEED_PATH, site_id, suffix
        ))
    }

    /// Endpoint receiving donated quantities
    pub fn update_quantity_url(&self) -> String {
        format!("{}{}", self.host_url, UPDATE_QUANTITY_PATH)
    }
}

/// Borrowed view of the `header.payload.signature` client credential.
///
/// The signature prefix only names the feed file on the host; the bearer
/// header remains the authentication boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientKey<'a> {
    pub header: &'a str,
    pub payload: &'a str,
    pub signature: &'a str,
}

impl<'a> ClientKey<'a> {
    pub fn parse(raw: &'a str) -> FetchResult<Self> {
        let mut parts = raw.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(header), Some(payload), Some(signature), None) => Ok(Self {
                header,
                payload,
                signature,
            }),
            _ => Err(FetchError::Config(
                "Client Key must have three dot-separated segments".to_string(),
            )),
        }
    }

    /// First eight characters of the signature segment
    pub fn suffix(&self) -> &'a str {
        match self.signature.char_indices().nth(KEY_SUFFIX_LEN) {
            Some((idx, _)) => &self.signature[..idx],
            None => self.signature,
        }
    }
}
