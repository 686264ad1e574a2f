//! # Application State
//!
//! Shared state for the Axum application: the provider registry built at
//! startup, the payment record store, and front-door configuration.

use crate::store::InMemoryPaymentStore;
use pay_comgate::ComGateProvider;
use pay_core::{BoxedPaymentProvider, PaymentResult, PaymentStore, ProviderId, ProviderRegistry};
use pay_fiobanka::FioBankaProvider;
use pay_payu::PayUProvider;
use pay_paypal::PayPalProvider;
use pay_stripe::StripeProvider;
use secrecy::SecretString;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_PORT: u16 = 3468;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Shared key required in `X-API-Key` on `/payments/*`; unset disables the check
    pub api_key: Option<SecretString>,
    /// Allowed browser origin; unset allows any
    pub cors_origin: Option<String>,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let port = std::env::var("SERVICE_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            host: std::env::var("SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            api_key: std::env::var("API_KEY")
                .ok()
                .filter(|key| !key.is_empty())
                .map(SecretString::new),
            cors_origin: std::env::var("CORS_ORIGIN").ok().filter(|o| !o.is_empty()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            api_key: None,
            cors_origin: None,
            environment: "development".to_string(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Provider adapters by provider id
    pub registry: ProviderRegistry,
    /// Created payments
    pub store: Arc<dyn PaymentStore>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// State with every provider whose configuration is present in the environment
    pub fn from_env(config: AppConfig) -> Self {
        Self::new(registry_from_env(), config)
    }

    pub fn new(registry: ProviderRegistry, config: AppConfig) -> Self {
        Self {
            registry,
            store: Arc::new(InMemoryPaymentStore::new()),
            config,
        }
    }
}

/// Register each adapter that can be configured; the rest are logged and skipped
pub fn registry_from_env() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();

    register(&mut registry, ProviderId::Stripe, || {
        Ok(Arc::new(StripeProvider::from_env()?) as BoxedPaymentProvider)
    });
    register(&mut registry, ProviderId::PayU, || {
        Ok(Arc::new(PayUProvider::from_env()?) as BoxedPaymentProvider)
    });
    register(&mut registry, ProviderId::ComGate, || {
        Ok(Arc::new(ComGateProvider::from_env()?) as BoxedPaymentProvider)
    });
    register(&mut registry, ProviderId::FioBanka, || {
        Ok(Arc::new(FioBankaProvider::from_env()?) as BoxedPaymentProvider)
    });
    register(&mut registry, ProviderId::PayPal, || {
        Ok(Arc::new(PayPalProvider::from_env()?) as BoxedPaymentProvider)
    });

    registry
}

fn register(
    registry: &mut ProviderRegistry,
    id: ProviderId,
    build: impl FnOnce() -> PaymentResult<BoxedPaymentProvider>,
) {
    match build() {
        Ok(provider) => {
            info!("Registered payment provider: {}", id);
            registry.register(provider);
        }
        Err(e) => warn!("Payment provider {} disabled: {}", id, e),
    }
}
