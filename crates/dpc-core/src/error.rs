//! # Donation Error Types
//!
//! Typed error handling for the donate-product client.
//! Fetching returns `Result<T, FetchError>`, reconciliation returns
//! `Result<T, ReconcileError>`.

use thiserror::Error;

/// Errors raised while fetching the campaign feed from the host
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Missing or malformed host URL / client key
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network, DNS or TLS failure talking to the host
    #[error("Transport error: {0}")]
    Transport(String),

    /// Host answered with a non-success status
    #[error("Host rejected request [{status}]: {message}")]
    HostRejected { status: u16, message: String },

    /// Feed body is not valid campaign JSON
    #[error("Parse error: {0}")]
    Parse(String),
}

impl FetchError {
    /// Only configuration problems are something the operator can fix in settings
    pub fn is_operator_visible(&self) -> bool {
        matches!(self, FetchError::Config(_))
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            FetchError::Config(_) => 500,
            FetchError::Transport(_) => 503,
            FetchError::HostRejected { .. } => 502,
            FetchError::Parse(_) => 502,
        }
    }
}

/// Delivery channel used during reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryChannel {
    /// `update_quantity` webhook on the host
    Webhook,
    /// Notification message to the host operator
    Mail,
}

impl std::fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryChannel::Webhook => write!(f, "webhook"),
            DeliveryChannel::Mail => write!(f, "mail"),
        }
    }
}

/// Errors raised while reconciling a completed order
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// Authoritative campaign data could not be re-fetched
    #[error("Campaign fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Webhook or mail delivery failed (non-fatal)
    #[error("Delivery failed [{channel}]: {message}")]
    Delivery {
        channel: DeliveryChannel,
        message: String,
    },

    /// Reported-order ledger could not be read or written
    #[error("Ledger error: {0}")]
    Ledger(String),
}

impl ReconcileError {
    pub fn delivery(channel: DeliveryChannel, message: impl Into<String>) -> Self {
        ReconcileError::Delivery {
            channel,
            message: message.into(),
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ReconcileError::Fetch(e) => e.status_code(),
            ReconcileError::Delivery { .. } => 502,
            ReconcileError::Ledger(_) => 500,
        }
    }
}

/// Errors raised while reading or saving operator settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid conversion rate: {0}")]
    InvalidConversionRate(String),

    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Settings serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Result type alias for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Result type alias for reconcile operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;
