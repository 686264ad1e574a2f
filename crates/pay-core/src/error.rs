//! # Payment Error Types
//!
//! Typed error handling for the payment gateway.
//! Every fallible provider operation returns `Result<T, PaymentError>`.
//! Webhook verification is the exception: it reports a plain `bool`.

use thiserror::Error;

/// Core error type for all payment operations
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Network or timeout failure reaching the provider
    #[error("Transport error [{provider}]: {message}")]
    Transport { provider: String, message: String },

    /// Provider answered with a non-success business code
    #[error("Provider rejection [{provider}]: {message}")]
    ProviderRejection { provider: String, message: String },

    /// No adapter registered for the requested method or provider id
    #[error("Unsupported payment provider: {provider}")]
    UnsupportedProvider { provider: String },

    /// Refund attempted without a resolvable underlying transaction
    #[error("Refund precondition failed: {0}")]
    RefundPrecondition(String),

    /// Payment record not found in the record store
    #[error("Payment not found: {payment_id}")]
    PaymentNotFound { payment_id: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PaymentError {
    /// Shorthand for a transport failure
    pub fn transport(provider: impl Into<String>, message: impl Into<String>) -> Self {
        PaymentError::Transport {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a provider rejection, keeping the provider's message
    pub fn rejection(provider: impl Into<String>, message: impl Into<String>) -> Self {
        PaymentError::ProviderRejection {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Shorthand for an unsupported provider or method
    pub fn unsupported(provider: impl Into<String>) -> Self {
        PaymentError::UnsupportedProvider {
            provider: provider.into(),
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::Configuration(_) => 500,
            PaymentError::InvalidRequest(_) => 400,
            PaymentError::Transport { .. } => 503,
            PaymentError::ProviderRejection { .. } => 502,
            PaymentError::UnsupportedProvider { .. } => 400,
            PaymentError::RefundPrecondition(_) => 422,
            PaymentError::PaymentNotFound { .. } => 404,
            PaymentError::Serialization(_) => 502,
        }
    }
}

/// Result type alias for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;
