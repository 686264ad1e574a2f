//! # Payment Contract Types
//!
//! Request/response values shared by every provider adapter.
//! Field names serialize in camelCase to match the wire contract.

use crate::amount::to_minor_units;
use crate::error::{PaymentError, PaymentResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Payment method a caller may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    PayU,
    Stripe,
    PayPal,
    FioBanka,
    ComGate,
    /// Card payments are processed by Stripe
    Card,
}

impl PaymentMethod {
    /// Every recognized payment method
    pub const ALL: [PaymentMethod; 6] = [
        PaymentMethod::PayU,
        PaymentMethod::Stripe,
        PaymentMethod::PayPal,
        PaymentMethod::FioBanka,
        PaymentMethod::ComGate,
        PaymentMethod::Card,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::PayU => "payu",
            PaymentMethod::Stripe => "stripe",
            PaymentMethod::PayPal => "paypal",
            PaymentMethod::FioBanka => "fiobanka",
            PaymentMethod::ComGate => "comgate",
            PaymentMethod::Card => "card",
        }
    }

    /// The provider whose adapter handles this method
    pub fn provider(&self) -> ProviderId {
        match self {
            PaymentMethod::PayU => ProviderId::PayU,
            PaymentMethod::Stripe | PaymentMethod::Card => ProviderId::Stripe,
            PaymentMethod::PayPal => ProviderId::PayPal,
            PaymentMethod::FioBanka => ProviderId::FioBanka,
            PaymentMethod::ComGate => ProviderId::ComGate,
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PaymentError::unsupported(s))
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider identifier used by webhook routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    PayPal,
    Stripe,
    PayU,
    FioBanka,
    ComGate,
}

impl ProviderId {
    pub const ALL: [ProviderId; 5] = [
        ProviderId::PayPal,
        ProviderId::Stripe,
        ProviderId::PayU,
        ProviderId::FioBanka,
        ProviderId::ComGate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::PayPal => "paypal",
            ProviderId::Stripe => "stripe",
            ProviderId::PayU => "payu",
            ProviderId::FioBanka => "fiobanka",
            ProviderId::ComGate => "comgate",
        }
    }

    /// Header carrying the webhook signature for this provider
    pub fn signature_header(&self) -> &'static str {
        match self {
            ProviderId::PayPal => "x-paypal-signature",
            ProviderId::Stripe => "stripe-signature",
            ProviderId::PayU => "openpayu-signature",
            ProviderId::FioBanka => "x-fio-signature",
            ProviderId::ComGate => "x-comgate-signature",
        }
    }
}

impl FromStr for ProviderId {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderId::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PaymentError::unsupported(s))
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status.
///
/// `Other` carries a provider's own status word for adapters that pass the
/// provider vocabulary through instead of normalizing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
    Other(String),
}

impl PaymentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
            PaymentStatus::Other(s) => s,
        }
    }

    /// Whether no further transition is expected from this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Failed | PaymentStatus::Refunded)
    }

    /// Whether the status model allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: &PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Completed)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
                | (PaymentStatus::Completed, PaymentStatus::Refunded)
        )
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "PENDING" => PaymentStatus::Pending,
            "COMPLETED" => PaymentStatus::Completed,
            "FAILED" => PaymentStatus::Failed,
            "REFUNDED" => PaymentStatus::Refunded,
            _ => PaymentStatus::Other(value),
        }
    }
}

impl From<PaymentStatus> for String {
    fn from(value: PaymentStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Refund status reported while a refund has not settled yet
pub const REFUND_PROCESSING: &str = "PROCESSING";

/// Paying customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Customer {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
            phone: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Split `name` into first name and the remainder
    pub fn split_name(&self) -> (String, String) {
        let name = self.name.as_deref().unwrap_or("");
        let mut parts = name.split_whitespace();
        let first = parts.next().unwrap_or("").to_string();
        let last = parts.collect::<Vec<_>>().join(" ");
        (first, last)
    }
}

/// Request to create a payment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub order_id: String,
    pub application_id: String,
    /// Major currency units
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// ISO 4217 code
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub callback_url: String,
    pub customer: Customer,
    /// Caller-defined values, passed through to providers that keep tags
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl CreatePaymentRequest {
    pub fn new(
        order_id: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
        payment_method: PaymentMethod,
        customer: Customer,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            application_id: String::new(),
            amount,
            currency: currency.into(),
            payment_method,
            callback_url: String::new(),
            customer,
            metadata: HashMap::new(),
        }
    }

    pub fn with_application_id(mut self, application_id: impl Into<String>) -> Self {
        self.application_id = application_id.into();
        self
    }

    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = url.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Metadata flattened to strings for provider tag fields
    pub fn metadata_tags(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.metadata.iter().map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.as_str(), value)
        })
    }

    /// Reject requests no provider could accept
    pub fn validate(&self) -> PaymentResult<()> {
        if self.order_id.trim().is_empty() {
            return Err(PaymentError::InvalidRequest("orderId is required".to_string()));
        }
        if self.amount <= Decimal::ZERO {
            return Err(PaymentError::InvalidRequest(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        to_minor_units(self.amount)?;
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PaymentError::InvalidRequest(format!(
                "currency must be an ISO 4217 code, got {:?}",
                self.currency
            )));
        }
        if self.customer.email.trim().is_empty() {
            return Err(PaymentError::InvalidRequest(
                "customer.email is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Human-readable description sent to providers
    pub fn description(&self) -> String {
        format!("Payment for order {}", self.order_id)
    }
}

/// Result of creating a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub payment_id: String,
    /// Present only when the provider needs a hosted redirect or QR step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    pub status: PaymentStatus,
    pub provider_transaction_id: String,
}

/// Request to refund a payment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundPaymentRequest {
    /// Provider transaction reference
    pub payment_id: String,
    /// Major units; `None` refunds the full amount
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl RefundPaymentRequest {
    pub fn full(payment_id: impl Into<String>) -> Self {
        Self {
            payment_id: payment_id.into(),
            amount: None,
            reason: None,
        }
    }

    pub fn partial(payment_id: impl Into<String>, amount: Decimal) -> Self {
        Self {
            payment_id: payment_id.into(),
            amount: Some(amount),
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn validate(&self) -> PaymentResult<()> {
        if self.payment_id.trim().is_empty() {
            return Err(PaymentError::InvalidRequest("paymentId is required".to_string()));
        }
        if let Some(amount) = self.amount {
            if amount <= Decimal::ZERO {
                return Err(PaymentError::InvalidRequest(
                    "refund amount must be positive".to_string(),
                ));
            }
            to_minor_units(amount)?;
        }
        Ok(())
    }
}

/// Result of a refund
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundPaymentResponse {
    pub refund_id: String,
    /// Provider-specific refund status
    pub status: String,
    /// Major units
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}
