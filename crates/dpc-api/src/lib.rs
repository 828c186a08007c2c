//! # dpc-api
//!
//! HTTP adapter for the donate-product client.
//!
//! The commerce platform calls these endpoints from its checkout, order
//! and thank-you hooks; the operator reads notices and edits settings.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/v1/checkout/donation-row` | Donation offer and row markup |
//! | POST | `/api/v1/checkout/fee` | Cart fee for the selection |
//! | POST | `/api/v1/orders/donation-item` | Donation line item |
//! | POST | `/api/v1/orders/completed` | Reconcile a completed order |
//! | GET | `/widget/donation-button` | Donation button markup |
//! | GET/PUT | `/api/v1/settings` | Operator settings |
//! | GET | `/api/v1/notices` | Pending operator notice |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
