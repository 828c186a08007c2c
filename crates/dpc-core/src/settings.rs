//! # Operator Settings
//!
//! Key/value options set by the site operator, persisted as TOML.
//! Keys keep the names the host documents for its clients
//! (`dpc_host_url`, `dpc_client_key`, ...).

use crate::config::ClientConfig;
use crate::error::SettingsError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Value stored when the operator leaves the conversion rate blank
pub const DEFAULT_CONVERSION_RATE: &str = "1";

/// Persisted operator options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub dpc_host_url: String,

    #[serde(default)]
    pub dpc_client_key: String,

    /// Stored verbatim as entered (after blank normalization)
    #[serde(default = "default_rate")]
    pub dpc_conversion_rate: String,

    /// Hidden platform product used for donation line items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpc_virtual_product_id: Option<String>,
}

fn default_rate() -> String {
    DEFAULT_CONVERSION_RATE.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dpc_host_url: String::new(),
            dpc_client_key: String::new(),
            dpc_conversion_rate: default_rate(),
            dpc_virtual_product_id: None,
        }
    }
}

/// Partial update submitted from the settings form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub dpc_host_url: Option<String>,
    pub dpc_client_key: Option<String>,
    pub dpc_conversion_rate: Option<String>,
}

impl Settings {
    /// Load settings from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Plugin activation: options exist and the virtual product is created once
    pub fn activate(&mut self) -> &str {
        self.ensure_virtual_product()
    }

    /// Plugin deactivation: forget the host credentials
    pub fn deactivate(&mut self) {
        self.dpc_host_url.clear();
        self.dpc_client_key.clear();
    }

    /// Virtual product id, created on first use and never regenerated
    pub fn ensure_virtual_product(&mut self) -> &str {
        self.dpc_virtual_product_id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .as_str()
    }

    pub fn set_host_url(&mut self, value: &str) {
        self.dpc_host_url = value.trim().to_string();
        self.ensure_virtual_product();
    }

    pub fn set_client_key(&mut self, value: &str) {
        self.dpc_client_key = value.trim().to_string();
        self.ensure_virtual_product();
    }

    /// Save the conversion rate. Blank becomes `"1"`; anything else must be
    /// a non-negative decimal and is stored exactly as entered.
    pub fn set_conversion_rate(&mut self, value: &str) -> Result<(), SettingsError> {
        let value = value.trim();
        if value.is_empty() {
            self.dpc_conversion_rate = DEFAULT_CONVERSION_RATE.to_string();
            return Ok(());
        }
        parse_rate(value)?;
        self.dpc_conversion_rate = value.to_string();
        Ok(())
    }

    /// Apply a form submission
    pub fn apply(&mut self, update: SettingsUpdate) -> Result<(), SettingsError> {
        if let Some(rate) = update.dpc_conversion_rate {
            self.set_conversion_rate(&rate)?;
        }
        if let Some(host) = update.dpc_host_url {
            self.set_host_url(&host);
        }
        if let Some(key) = update.dpc_client_key {
            self.set_client_key(&key);
        }
        Ok(())
    }

    /// Parsed conversion rate (blank counts as 1)
    pub fn conversion_rate(&self) -> Result<Decimal, SettingsError> {
        let raw = self.dpc_conversion_rate.trim();
        if raw.is_empty() {
            return Ok(Decimal::ONE);
        }
        parse_rate(raw)
    }

    /// Per-request client configuration
    pub fn client_config(&self) -> Result<ClientConfig, SettingsError> {
        Ok(
            ClientConfig::new(self.dpc_host_url.as_str(), self.dpc_client_key.as_str())
                .with_conversion_rate(self.conversion_rate()?),
        )
    }
}

fn parse_rate(raw: &str) -> Result<Decimal, SettingsError> {
    let rate = Decimal::from_str(raw)
        .map_err(|_| SettingsError::InvalidConversionRate(raw.to_string()))?;
    if rate.is_sign_negative() {
        return Err(SettingsError::InvalidConversionRate(raw.to_string()));
    }
    Ok(rate)
}
