//! # PayPal Configuration

use pay_core::PaymentError;
use secrecy::SecretString;
use std::env;

const SANDBOX_API_URL: &str = "https://api-m.sandbox.paypal.com";
const LIVE_API_URL: &str = "https://api-m.paypal.com";

/// PayPal REST app credentials
#[derive(Debug, Clone)]
pub struct PayPalConfig {
    pub client_id: String,

    pub client_secret: SecretString,

    /// Shared secret for notification HMACs; empty rejects every webhook
    pub webhook_secret: SecretString,

    pub sandbox: bool,

    /// API base URL
    pub api_base_url: String,
}

impl PayPalConfig {
    /// Load configuration from environment variables.
    ///
    /// Required: `PAYPAL_CLIENT_ID`, `PAYPAL_CLIENT_SECRET`.
    /// Optional: `PAYPAL_WEBHOOK_SECRET`, `PAYPAL_SANDBOX` (`true`), `PAYPAL_API_URL`.
    pub fn from_env() -> Result<Self, PaymentError> {
        dotenvy::dotenv().ok();

        let required = |name: &str| {
            env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| PaymentError::Configuration(format!("{} not set", name)))
        };

        let mut config = Self::new(required("PAYPAL_CLIENT_ID")?, required("PAYPAL_CLIENT_SECRET")?)
            .with_sandbox(env::var("PAYPAL_SANDBOX").map(|v| v == "true").unwrap_or(false));
        config.webhook_secret = SecretString::new(env::var("PAYPAL_WEBHOOK_SECRET").unwrap_or_default());
        if let Ok(url) = env::var("PAYPAL_API_URL") {
            config.api_base_url = url;
        }
        Ok(config)
    }

    /// Create config with explicit values (live endpoint)
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            webhook_secret: SecretString::new(String::new()),
            sandbox: false,
            api_base_url: LIVE_API_URL.to_string(),
        }
    }

    /// Switch environment; also moves the base URL to the matching default
    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self.api_base_url = if sandbox { SANDBOX_API_URL } else { LIVE_API_URL }.to_string();
        self
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = SecretString::new(secret.into());
        self
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}
