//! # Payment Gateway
//!
//! ## Usage
//!
//! ```bash
//! # Credentials for the providers to enable (any subset)
//! export COMGATE_MERCHANT_ID=... COMGATE_SECRET_KEY=...
//! export FIO_BANKA_API_KEY=... FIO_BANKA_ACCOUNT_NUMBER=...
//! export API_KEY=...            # optional X-API-Key guard
//! export LOG_FORMAT=json        # optional structured logs
//!
//! payment-gateway
//! ```

use pay_api::{routes, AppConfig, AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env();
    let addr = config.socket_addr()?;

    info!("Environment: {}", config.environment);
    if config.api_key.is_none() {
        info!("API_KEY not set; /payments endpoints are open");
    }

    let is_prod = config.is_production();
    let state = AppState::from_env(config);
    info!("Payment providers: {:?}", state.registry.providers());

    let app = routes::create_router(state);

    info!("Payment gateway listening on http://{}", addr);
    if !is_prod {
        info!("Create: POST http://{}/payments/create", addr);
        info!("Webhooks: POST http://{}/webhooks/{{provider}}", addr);
    }
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let json = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);
    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}
