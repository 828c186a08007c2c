//! # dpc-host
//!
//! Donation host integration for the donate-product client.
//!
//! This crate provides:
//!
//! 1. **HostClient** - `CampaignSource` over HTTP
//!    - Per-site campaign feed (`GET`, bearer client key)
//!    - `update_quantity` report (`POST`, JSON)
//!
//! 2. **Reconciler** - Reports a completed order's donation once
//!    - Re-fetches the campaign, reports the quantity, notifies the operator
//!    - Guarded by a `ReportLedger` keyed on order id
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dpc_host::{HostClient, InMemoryLedger, LoggingNotifier, Reconciler};
//! use std::sync::Arc;
//!
//! let host = Arc::new(HostClient::from_env()?);
//! let reconciler = Reconciler::new(host, Arc::new(LoggingNotifier), Arc::new(InMemoryLedger::new()));
//!
//! match reconciler.reconcile(&order, &config, &ctx).await? {
//!     ReconcileOutcome::Reported(report) => println!("reported {}", report.total_donation),
//!     other => println!("{:?}", other),
//! }
//! ```

pub mod client;
pub mod config;
pub mod ledger;
pub mod mail;
pub mod reconcile;

// Re-exports
pub use client::HostClient;
pub use config::HostConfig;
pub use ledger::{FileLedger, InMemoryLedger};
pub use mail::{HttpMailRelay, LoggingNotifier};
pub use reconcile::{DeliveryStatus, DonationReport, ReconcileOutcome, Reconciler, DEFAULT_LOCALE};
