//! # Fio banka Configuration

use pay_core::PaymentError;
use secrecy::SecretString;
use std::env;

const DEFAULT_API_BASE_URL: &str = "https://www.fio.cz/ib_api/rest";
const DEFAULT_QR_API_URL: &str = "https://api.qrserver.com/v1/create-qr-code";
const DEFAULT_LOOKBACK_DAYS: i64 = 90;

/// Fio banka account configuration
#[derive(Debug, Clone)]
pub struct FioBankaConfig {
    /// Read-only API token; travels inside the statement URL path
    pub api_key: SecretString,

    /// Merchant account the customer pays to (`ACC` in the QR payload)
    pub account_number: String,

    /// Statement API base URL
    pub api_base_url: String,

    /// QR image rendering endpoint
    pub qr_api_url: String,

    /// How far back the statement query reaches, in days
    pub lookback_days: i64,
}

impl FioBankaConfig {
    /// Load configuration from environment variables.
    ///
    /// Required: `FIO_BANKA_API_KEY`, `FIO_BANKA_ACCOUNT_NUMBER`.
    /// Optional: `FIO_BANKA_API_URL`, `QR_CODE_API_URL`, `FIO_BANKA_LOOKBACK_DAYS`.
    pub fn from_env() -> Result<Self, PaymentError> {
        dotenvy::dotenv().ok();

        let api_key = env::var("FIO_BANKA_API_KEY")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| PaymentError::Configuration("FIO_BANKA_API_KEY not set".to_string()))?;
        let account_number = env::var("FIO_BANKA_ACCOUNT_NUMBER")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                PaymentError::Configuration("FIO_BANKA_ACCOUNT_NUMBER not set".to_string())
            })?;

        let mut config = Self::new(api_key, account_number);
        if let Ok(url) = env::var("FIO_BANKA_API_URL") {
            config.api_base_url = url;
        }
        if let Ok(url) = env::var("QR_CODE_API_URL") {
            config.qr_api_url = url;
        }
        if let Ok(days) = env::var("FIO_BANKA_LOOKBACK_DAYS") {
            config.lookback_days = days.parse().map_err(|_| {
                PaymentError::Configuration(format!(
                    "FIO_BANKA_LOOKBACK_DAYS must be a number of days, got {:?}",
                    days
                ))
            })?;
        }
        Ok(config)
    }

    pub fn new(api_key: impl Into<String>, account_number: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            account_number: account_number.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            qr_api_url: DEFAULT_QR_API_URL.to_string(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_qr_api_url(mut self, url: impl Into<String>) -> Self {
        self.qr_api_url = url.into();
        self
    }

    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = days;
        self
    }
}
