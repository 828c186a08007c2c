//! # donate-product-client
//!
//! Donation campaign client for a commerce site.
//!
//! ## Usage
//!
//! ```bash
//! # Optional process settings
//! export DPC_SETTINGS_PATH=config/client.toml
//! export DPC_LEDGER_PATH=data/reported.jsonl
//! export DPC_CALLBACK_SECRET=change-me
//!
//! # Run the server
//! donate-product-client
//! ```

use dpc_api::{routes, state::AppConfig, state::AppState};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    let config = AppConfig::from_env()?;
    let addr = config.socket_addr()?;
    let state = AppState::from_config(config).await?;

    info!("Settings: {}", state.config.settings_path.display());
    info!(
        "Currency: {}, locale: {}",
        state.config.currency, state.config.locale
    );
    if state.config.callback_secret.is_none() {
        warn!("DPC_CALLBACK_SECRET not set, callbacks are accepted unsigned");
    }
    if state.client_config().await?.validate().is_err() {
        warn!("Donation host not configured yet: PUT /api/v1/settings");
    }

    let app = routes::create_router(state);

    info!("donate-product-client listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  donate-product-client
  ---------------------
  Donation campaigns at checkout
  Version: {}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
