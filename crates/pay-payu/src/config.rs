//! # PayU Configuration
//!
//! POS and OAuth client credentials for the PayU REST API.

use pay_core::PaymentError;
use secrecy::SecretString;
use std::env;

const SANDBOX_API_URL: &str = "https://secure.snd.payu.com";
const PRODUCTION_API_URL: &str = "https://secure.payu.com";

/// PayU API configuration
#[derive(Debug, Clone)]
pub struct PayUConfig {
    /// Point-of-sale id (`merchantPosId`)
    pub pos_id: String,

    /// OAuth client id
    pub client_id: String,

    /// OAuth client secret, also the signing key
    pub client_secret: SecretString,

    /// Sandbox environment
    pub sandbox: bool,

    /// API base URL
    pub api_base_url: String,
}

impl PayUConfig {
    /// Load configuration from environment variables.
    ///
    /// Required: `PAYU_POS_ID`, `PAYU_CLIENT_ID`, `PAYU_CLIENT_SECRET`.
    /// Optional: `PAYU_SANDBOX` (`true`), `PAYU_API_URL_SANDBOX`,
    /// `PAYU_API_URL_PRODUCTION`.
    pub fn from_env() -> Result<Self, PaymentError> {
        dotenvy::dotenv().ok();

        let required = |name: &str| {
            env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| PaymentError::Configuration(format!("{} not set", name)))
        };

        let pos_id = required("PAYU_POS_ID")?;
        let client_id = required("PAYU_CLIENT_ID")?;
        let client_secret = required("PAYU_CLIENT_SECRET")?;
        let sandbox = env::var("PAYU_SANDBOX").map(|v| v == "true").unwrap_or(false);

        let api_base_url = if sandbox {
            env::var("PAYU_API_URL_SANDBOX").unwrap_or_else(|_| SANDBOX_API_URL.to_string())
        } else {
            env::var("PAYU_API_URL_PRODUCTION").unwrap_or_else(|_| PRODUCTION_API_URL.to_string())
        };

        Ok(Self::new(pos_id, client_id, client_secret)
            .with_sandbox(sandbox)
            .with_api_base_url(api_base_url))
    }

    /// Create config with explicit values (production endpoint)
    pub fn new(
        pos_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            pos_id: pos_id.into(),
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            sandbox: false,
            api_base_url: PRODUCTION_API_URL.to_string(),
        }
    }

    /// Builder: switch to sandbox (also resets the base URL to the sandbox default)
    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self.api_base_url = if sandbox { SANDBOX_API_URL } else { PRODUCTION_API_URL }.to_string();
        self
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}
