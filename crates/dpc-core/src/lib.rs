//! # dpc-core
//!
//! Core types and traits for the donate-product client.
//!
//! This crate provides:
//! - `ClientConfig` and `RequestContext`, passed explicitly into every call
//! - `CampaignRecord`, the host's campaign feed
//! - Checkout presentation: `DonationOffer`, `DonationSelection`, fees,
//!   order line items and the `[dpc_donation_button]` widget
//! - `CampaignSource`, `DonationNotifier` and `ReportLedger` seams
//! - `Settings` for operator options
//! - `FetchError` / `ReconcileError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use dpc_core::{ClientConfig, Currency, DonationOffer, RequestContext};
//!
//! let config = settings.client_config()?;
//! let ctx = RequestContext::new("shop.example.com");
//!
//! // Fetch the campaign (HostClient implements CampaignSource)
//! let record = source.fetch_campaign(&config, &ctx).await.ok();
//!
//! // Render the checkout row for active campaigns
//! let row = record
//!     .as_ref()
//!     .and_then(|r| DonationOffer::from_campaign(r, config.conversion_rate, Currency::USD))
//!     .map(|offer| offer.render_row());
//! ```

pub mod campaign;
pub mod checkout;
pub mod config;
pub mod error;
pub mod notify;
pub mod order;
pub mod price;
pub mod settings;
pub mod site;
pub mod source;
pub mod widget;

// Re-exports for convenience
pub use campaign::CampaignRecord;
pub use checkout::{
    donation_fee, donation_line_item, DonationOffer, DonationSelection, Fee,
};
pub use config::{ClientConfig, ClientKey};
pub use error::{
    DeliveryChannel, FetchError, FetchResult, ReconcileError, ReconcileResult, SettingsError,
};
pub use notify::compose_notification;
pub use order::{CompletedOrder, OrderDonationMeta, OrderLineItem, OrderStatus};
pub use price::{Currency, Price};
pub use settings::{Settings, SettingsUpdate};
pub use site::RequestContext;
pub use source::{
    BoxedCampaignSource, BoxedLedger, BoxedNotifier, CampaignSource, DonationNotifier,
    NotificationMessage, QuantityReport, ReportLedger,
};
pub use widget::render_donation_button;
