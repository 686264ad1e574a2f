//! # ComGate Configuration

use pay_core::PaymentError;
use secrecy::SecretString;
use std::env;

const DEFAULT_API_BASE_URL: &str = "https://payments.comgate.cz/v1.0";

/// ComGate merchant configuration
#[derive(Debug, Clone)]
pub struct ComGateConfig {
    /// Merchant identifier
    pub merchant_id: String,

    /// Shared secret appended to every hashed payload
    pub secret_key: SecretString,

    /// Send `test=true` with every payment
    pub test_mode: bool,

    /// API base URL
    pub api_base_url: String,

    /// Base for synthesized redirect URLs (defaults to `api_base_url`)
    pub redirect_base_url: Option<String>,
}

impl ComGateConfig {
    /// Load configuration from environment variables.
    ///
    /// Required: `COMGATE_MERCHANT_ID`, `COMGATE_SECRET_KEY`.
    /// Optional: `COMGATE_TEST_MODE`, `COMGATE_API_URL`, `COMGATE_REDIRECT_BASE_URL`.
    pub fn from_env() -> Result<Self, PaymentError> {
        dotenvy::dotenv().ok();

        let merchant_id = env::var("COMGATE_MERCHANT_ID")
            .map_err(|_| PaymentError::Configuration("COMGATE_MERCHANT_ID not set".to_string()))?;
        let secret_key = env::var("COMGATE_SECRET_KEY")
            .map_err(|_| PaymentError::Configuration("COMGATE_SECRET_KEY not set".to_string()))?;

        let mut config = Self::new(merchant_id, secret_key);
        config.test_mode = env::var("COMGATE_TEST_MODE").map(|v| v == "true").unwrap_or(false);
        if let Ok(url) = env::var("COMGATE_API_URL") {
            config.api_base_url = url;
        }
        config.redirect_base_url = env::var("COMGATE_REDIRECT_BASE_URL").ok();
        Ok(config)
    }

    pub fn new(merchant_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            secret_key: SecretString::new(secret_key.into()),
            test_mode: false,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            redirect_base_url: None,
        }
    }

    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Hosted payment page for a transaction
    pub fn redirect_url(&self, trans_id: &str) -> String {
        let base = self.redirect_base_url.as_deref().unwrap_or(&self.api_base_url);
        format!("{}/redirect?transId={}", base.trim_end_matches('/'), trans_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_url_falls_back_to_api_base() {
        let config = ComGateConfig::new("M1", "secret");
        assert_eq!(
            config.redirect_url("T1"),
            "https://payments.comgate.cz/v1.0/redirect?transId=T1"
        );

        let config = ComGateConfig {
            redirect_base_url: Some("https://pay.example/".to_string()),
            ..config
        };
        assert_eq!(config.redirect_url("T1"), "https://pay.example/redirect?transId=T1");
    }
}
