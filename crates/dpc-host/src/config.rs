//! # Transport Configuration
//!
//! Settings for the HTTP transport to the donation host.
//! Values are loaded from environment variables (and `.env` if present).

use dpc_core::FetchError;
use std::env;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP transport configuration
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Skip TLS certificate verification. Off unless the operator opts out.
    pub accept_invalid_certs: bool,

    /// Per-request timeout
    pub timeout: Duration,

    /// User agent sent to the host
    pub user_agent: String,
}

impl HostConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional env vars:
    /// - `DPC_ACCEPT_INVALID_CERTS` (`true`/`1` to disable certificate checks)
    /// - `DPC_HTTP_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, FetchError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let accept_invalid_certs = match env::var("DPC_ACCEPT_INVALID_CERTS") {
            Ok(v) => parse_flag(&v).ok_or_else(|| {
                FetchError::Config(format!("DPC_ACCEPT_INVALID_CERTS is not a boolean: {}", v))
            })?,
            Err(_) => false,
        };

        let timeout_secs = match env::var("DPC_HTTP_TIMEOUT_SECS") {
            Ok(v) => v.trim().parse::<u64>().map_err(|_| {
                FetchError::Config(format!("DPC_HTTP_TIMEOUT_SECS is not a number: {}", v))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            accept_invalid_certs,
            timeout: Duration::from_secs(timeout_secs),
            ..Self::default()
        })
    }

    /// Builder: disable certificate verification
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Builder: set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            accept_invalid_certs: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("donate-product-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
