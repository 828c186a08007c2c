//! # Routes
//!
//! Axum router for the platform callbacks, the widget and operator settings.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Checkout callbacks:
///   - POST /api/v1/checkout/donation-row - Offer and HTML row
///   - POST /api/v1/checkout/fee - Cart fee for the selection
///
/// - Order callbacks:
///   - POST /api/v1/orders/donation-item - Line item at order creation
///   - POST /api/v1/orders/completed - Reconcile a completed order
///
/// - Operator:
///   - GET/PUT /api/v1/settings
///   - GET /api/v1/notices - Take the pending notice
///
/// - Widget:
///   - GET /widget/donation-button?site_host=
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let checkout_routes = Router::new()
        .route("/donation-row", post(handlers::donation_row))
        .route("/fee", post(handlers::donation_fee_for_cart));

    let order_routes = Router::new()
        .route("/donation-item", post(handlers::donation_item))
        .route("/completed", post(handlers::order_completed));

    let api_routes = Router::new()
        .nest("/checkout", checkout_routes)
        .nest("/orders", order_routes)
        .route(
            "/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .route("/notices", get(handlers::take_notice));

    let widget_routes =
        Router::new().route("/donation-button", get(handlers::donation_button));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api/v1", api_routes)
        .nest("/widget", widget_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
