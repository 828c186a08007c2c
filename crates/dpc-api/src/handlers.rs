//! # Request Handlers
//!
//! Axum handlers for the platform callbacks.
//! Presentation callbacks never fail the buyer's request: fetch problems
//! become an operator notice and an empty result.

use crate::state::{AppState, NoticeLevel};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use dpc_core::{
    donation_fee, donation_line_item, render_donation_button, CampaignRecord, CampaignSource,
    ClientConfig, CompletedOrder, DonationOffer, DonationSelection, Fee, FetchError,
    OrderLineItem, RequestContext, Settings, SettingsError, SettingsUpdate,
};
use dpc_host::ReconcileOutcome;
use hmac::{Hmac, Mac};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::Sha256;
use tracing::{error, info, instrument, warn};

/// Header carrying `sha256=<hex HMAC-SHA256(secret, body)>`
pub const SIGNATURE_HEADER: &str = "x-dpc-signature";

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Donation row for the checkout review table
#[derive(Debug, Default, Serialize)]
pub struct DonationRowResponse {
    pub offer: Option<DonationOffer>,
    pub html: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct FeeResponse {
    pub fee: Option<Fee>,
    /// Formatted amount, e.g. `$40.00`
    pub display: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct DonationItemResponse {
    pub item: Option<OrderLineItem>,
}

/// Completion callback body
#[derive(Debug, Deserialize)]
pub struct OrderCompletedRequest {
    pub context: RequestContext,
    pub order: CompletedOrder,
}

#[derive(Debug, Deserialize)]
pub struct WidgetQuery {
    pub site_host: String,
}

/// Settings as shown to the operator (client key masked)
#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub dpc_host_url: String,
    pub dpc_client_key_set: bool,
    pub dpc_conversion_rate: String,
    pub dpc_virtual_product_id: Option<String>,
}

impl From<&Settings> for SettingsView {
    fn from(settings: &Settings) -> Self {
        Self {
            dpc_host_url: settings.dpc_host_url.clone(),
            dpc_client_key_set: !settings.dpc_client_key.is_empty(),
            dpc_conversion_rate: settings.dpc_conversion_rate.clone(),
            dpc_virtual_product_id: settings.dpc_virtual_product_id.clone(),
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(code: u16, message: impl Into<String>) -> ApiError {
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ErrorResponse::new(message, code)),
    )
}

fn settings_error_to_response(err: SettingsError) -> ApiError {
    match err {
        SettingsError::InvalidConversionRate(_) => api_error(400, err.to_string()),
        _ => {
            error!("Settings error: {}", err);
            api_error(500, err.to_string())
        }
    }
}

// =============================================================================
// Signatures
// =============================================================================

/// Signature header value for `body`
pub fn sign_body(secret: &str, body: &[u8]) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

fn signature_matches(secret: &str, signature: &str, body: &[u8]) -> bool {
    let Some(hex_sig) = signature.trim().strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };
    let Ok(mut mac) = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Verify the callback signature (when a secret is configured) and parse the body
fn verified_json<T: DeserializeOwned>(
    state: &AppState,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<T, ApiError> {
    if let Some(ref secret) = state.config.callback_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| api_error(401, "Missing X-Dpc-Signature header"))?;
        if !signature_matches(secret, signature, body) {
            warn!("Rejected callback with bad signature");
            return Err(api_error(401, "Invalid signature"));
        }
    }

    serde_json::from_slice(body).map_err(|e| api_error(400, format!("Invalid request body: {}", e)))
}

// =============================================================================
// Presentation helpers
// =============================================================================

/// Fetch the campaign for `ctx`, turning failures into an operator notice
async fn fetch_campaign(
    state: &AppState,
    ctx: &RequestContext,
) -> Option<(ClientConfig, CampaignRecord)> {
    let config = match state.client_config().await {
        Ok(config) => config,
        Err(e) => {
            warn!("Unusable settings: {}", e);
            state.record_notice(e.to_string(), NoticeLevel::Error).await;
            return None;
        }
    };

    match state.source.fetch_campaign(&config, ctx).await {
        Ok(record) => Some((config, record)),
        Err(e) => {
            record_fetch_failure(state, &e).await;
            None
        }
    }
}

async fn record_fetch_failure(state: &AppState, err: &FetchError) {
    let level = if err.is_operator_visible() {
        NoticeLevel::Error
    } else {
        NoticeLevel::Warning
    };
    warn!("Campaign fetch failed: {}", err);
    state
        .record_notice(format!("Donation campaign unavailable: {}", err), level)
        .await;
}

async fn current_offer(state: &AppState, ctx: &RequestContext) -> Option<DonationOffer> {
    let (config, record) = fetch_campaign(state, ctx).await?;
    DonationOffer::from_campaign(&record, config.conversion_rate, state.config.currency)
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "donate-product-client",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Donation row for the checkout review table
#[instrument(skip(state, headers, body))]
pub async fn donation_row(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DonationRowResponse>, ApiError> {
    let ctx: RequestContext = verified_json(&state, &headers, &body)?;

    let Some(offer) = current_offer(&state, &ctx).await else {
        return Ok(Json(DonationRowResponse::default()));
    };

    Ok(Json(DonationRowResponse {
        html: Some(offer.render_row()),
        offer: Some(offer),
    }))
}

/// Cart fee for the submitted donation selection
#[instrument(skip(state, headers, body))]
pub async fn donation_fee_for_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<FeeResponse>, ApiError> {
    let ctx: RequestContext = verified_json(&state, &headers, &body)?;

    let Some(offer) = current_offer(&state, &ctx).await else {
        return Ok(Json(FeeResponse::default()));
    };

    let selection = DonationSelection::from_fields(&ctx, &offer);
    let fee = donation_fee(&offer, &selection);

    Ok(Json(FeeResponse {
        display: fee.as_ref().map(|f| f.amount.display()),
        fee,
    }))
}

/// Line item to attach when the order is created
#[instrument(skip(state, headers, body))]
pub async fn donation_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DonationItemResponse>, ApiError> {
    let ctx: RequestContext = verified_json(&state, &headers, &body)?;

    let Some(offer) = current_offer(&state, &ctx).await else {
        return Ok(Json(DonationItemResponse::default()));
    };

    let selection = DonationSelection::from_fields(&ctx, &offer);
    if !selection.selected {
        return Ok(Json(DonationItemResponse::default()));
    }

    let virtual_product_id = state
        .virtual_product_id()
        .await
        .map_err(settings_error_to_response)?;

    let item = donation_line_item(&offer, &selection, &virtual_product_id);
    if let Some(ref item) = item {
        info!(
            "Donation attached: campaign={}, quantity={}, total={}",
            offer.campaign_name, item.quantity, item.total
        );
    }

    Ok(Json(DonationItemResponse { item }))
}

/// Thank-you callback: reconcile the completed order
#[instrument(skip(state, headers, body))]
pub async fn order_completed(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ReconcileOutcome>, ApiError> {
    let request: OrderCompletedRequest = verified_json(&state, &headers, &body)?;

    let config = state
        .client_config()
        .await
        .map_err(settings_error_to_response)?;

    let outcome = state
        .reconciler
        .reconcile(&request.order, &config, &request.context)
        .await
        .map_err(|e| {
            error!("Reconciliation failed for order {}: {}", request.order.order_id, e);
            api_error(e.status_code(), e.to_string())
        })?;

    Ok(Json(outcome))
}

/// `[dpc_donation_button]` widget markup
#[instrument(skip(state))]
pub async fn donation_button(
    State(state): State<AppState>,
    Query(query): Query<WidgetQuery>,
) -> Html<String> {
    let ctx = RequestContext::new(query.site_host);
    let record = fetch_campaign(&state, &ctx).await.map(|(_, record)| record);
    Html(render_donation_button(record.as_ref()))
}

/// Current operator settings
pub async fn get_settings(State(state): State<AppState>) -> Json<SettingsView> {
    let settings = state.settings.read().await;
    Json(SettingsView::from(&*settings))
}

/// Update operator settings; nothing is saved if any field is invalid
#[instrument(skip(state, headers, body))]
pub async fn update_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SettingsView>, ApiError> {
    let update: SettingsUpdate = verified_json(&state, &headers, &body)?;

    let mut settings = state.settings.write().await;
    let mut updated = settings.clone();
    updated.apply(update).map_err(settings_error_to_response)?;

    state
        .save_settings(&updated)
        .await
        .map_err(settings_error_to_response)?;
    *settings = updated;

    info!("Settings saved: host={}", settings.dpc_host_url);
    Ok(Json(SettingsView::from(&*settings)))
}

/// Take the pending operator notice
pub async fn take_notice(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "notice": state.take_notice().await }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new("Test error", 400);
        assert_eq!(err.error, "Test error");
        assert_eq!(err.code, 400);
    }

    #[test]
    fn test_settings_error_conversion() {
        let err = SettingsError::InvalidConversionRate("abc".to_string());
        let (status, _json) = settings_error_to_response(err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_signature_round_trip() {
        let body = br#"{"site_host":"shop.example.com"}"#;
        let signature = sign_body("s3cret", body);
        assert!(signature.starts_with("sha256="));
        assert!(signature_matches("s3cret", &signature, body));
        assert!(!signature_matches("other", &signature, body));
        assert!(!signature_matches("s3cret", &signature, b"{}"));
        assert!(!signature_matches("s3cret", "sha256=zz", body));
        assert!(!signature_matches("s3cret", &signature[7..], body));
    }

    #[test]
    fn test_settings_view_masks_key() {
        let mut settings = Settings::default();
        settings.set_client_key("aaa.bbb.ccc");
        let view = SettingsView::from(&settings);
        assert!(view.dpc_client_key_set);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("aaa.bbb.ccc"));
    }
}
