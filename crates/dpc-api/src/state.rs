//! # Application State
//!
//! Shared state for the Axum application.
//! Holds the operator settings, the host source, the reconciler and the
//! pending operator notice.

use anyhow::Context;
use chrono::{DateTime, Utc};
use dpc_core::{BoxedCampaignSource, BoxedLedger, BoxedNotifier, ClientConfig, Currency, Settings, SettingsError};
use dpc_host::{
    FileLedger, HostClient, HostConfig, HttpMailRelay, InMemoryLedger, LoggingNotifier, Reconciler,
    DEFAULT_LOCALE,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

const DEFAULT_SETTINGS_PATH: &str = "config/client.toml";

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Operator settings file (TOML)
    pub settings_path: PathBuf,
    /// JSON-lines ledger of reported orders; in-memory when unset
    pub ledger_path: Option<PathBuf>,
    /// Shared secret for signed callbacks
    pub callback_secret: Option<String>,
    /// Operator locale for notifications
    pub locale: String,
    /// Shop currency used for display
    pub currency: Currency,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let currency = match std::env::var("DPC_CURRENCY") {
            Ok(v) => v
                .parse::<Currency>()
                .map_err(|e| anyhow::anyhow!("Invalid DPC_CURRENCY: {}", e))?,
            Err(_) => defaults.currency,
        };

        Ok(Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            settings_path: std::env::var("DPC_SETTINGS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.settings_path),
            ledger_path: non_empty_var("DPC_LEDGER_PATH").map(PathBuf::from),
            callback_secret: non_empty_var("DPC_CALLBACK_SECRET"),
            locale: non_empty_var("DPC_LOCALE").unwrap_or(defaults.locale),
            currency,
        })
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid socket address {}:{}", self.host, self.port))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            settings_path: PathBuf::from(DEFAULT_SETTINGS_PATH),
            ledger_path: None,
            callback_secret: None,
            locale: DEFAULT_LOCALE.to_string(),
            currency: Currency::default(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Error,
    Warning,
}

/// Admin notice shown once on the next operator page load
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub message: String,
    pub level: NoticeLevel,
    pub created_at: DateTime<Utc>,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Operator settings
    pub settings: Arc<RwLock<Settings>>,
    /// Campaign feed and quantity reports
    pub source: BoxedCampaignSource,
    /// Completed-order reconciliation
    pub reconciler: Arc<Reconciler>,
    notice: Arc<Mutex<Option<Notice>>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        settings: Settings,
        source: BoxedCampaignSource,
        reconciler: Reconciler,
    ) -> Self {
        Self {
            config,
            settings: Arc::new(RwLock::new(settings)),
            source,
            reconciler: Arc::new(reconciler),
            notice: Arc::new(Mutex::new(None)),
        }
    }

    /// Build the production state: settings file, host client, mail relay and ledger
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let settings = load_settings(&config.settings_path).await?;

        let host_config = HostConfig::from_env()?;
        let timeout = host_config.timeout;
        let host: BoxedCampaignSource = Arc::new(HostClient::new(host_config)?);

        let notifier: BoxedNotifier = {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .context("Failed to create mail relay client")?;
            match HttpMailRelay::from_env(client) {
                Some(relay) => Arc::new(relay),
                None => {
                    warn!("DPC_MAIL_RELAY_URL not set, notifications are logged only");
                    Arc::new(LoggingNotifier)
                }
            }
        };

        let ledger: BoxedLedger = match config.ledger_path {
            Some(ref path) => Arc::new(FileLedger::open(path).await?),
            None => {
                warn!("DPC_LEDGER_PATH not set, reported orders are remembered in memory only");
                Arc::new(InMemoryLedger::new())
            }
        };

        let reconciler =
            Reconciler::new(host.clone(), notifier, ledger).with_locale(config.locale.clone());

        let state = Self::new(config, settings, host, reconciler);
        state.save_settings(&*state.settings.read().await).await?;
        Ok(state)
    }

    /// Per-request client configuration from the current settings
    pub async fn client_config(&self) -> Result<ClientConfig, SettingsError> {
        self.settings.read().await.client_config()
    }

    /// Virtual product id, created and persisted if missing
    pub async fn virtual_product_id(&self) -> Result<String, SettingsError> {
        if let Some(id) = self.settings.read().await.dpc_virtual_product_id.clone() {
            return Ok(id);
        }
        let mut settings = self.settings.write().await;
        let id = settings.ensure_virtual_product().to_string();
        self.save_settings(&settings).await?;
        Ok(id)
    }

    /// Persist settings to the settings file
    pub async fn save_settings(&self, settings: &Settings) -> Result<(), SettingsError> {
        let path = &self.config.settings_path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, settings.to_toml()?).await?;
        Ok(())
    }

    /// Replace the pending notice
    pub async fn record_notice(&self, message: impl Into<String>, level: NoticeLevel) {
        *self.notice.lock().await = Some(Notice {
            message: message.into(),
            level,
            created_at: Utc::now(),
        });
    }

    /// Take the pending notice, clearing it
    pub async fn take_notice(&self) -> Option<Notice> {
        self.notice.lock().await.take()
    }
}

/// Load operator settings, activating on first run
async fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = match tokio::fs::read_to_string(path).await {
        Ok(content) => Settings::from_toml(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No settings at {}, starting unconfigured", path.display());
            Settings::default()
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };

    let virtual_product = settings.activate().to_string();
    info!("Virtual donation product: {}", virtual_product);
    Ok(settings)
}
