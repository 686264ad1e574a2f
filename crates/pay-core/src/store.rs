//! # Payment Record Store
//!
//! Interface to the persistence layer that keeps payment records.
//! The core never calls it; the front door records what adapters return.

use crate::error::PaymentResult;
use crate::payment::{CreatePaymentRequest, CreatePaymentResponse, PaymentMethod, PaymentStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    /// Local identifier handed to callers
    pub payment_id: String,
    pub order_id: String,
    pub application_id: String,
    pub payment_method: PaymentMethod,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub provider_transaction_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// Record a freshly created payment under a new local id
    pub fn from_created(request: &CreatePaymentRequest, response: &CreatePaymentResponse) -> Self {
        Self {
            payment_id: Uuid::new_v4().to_string(),
            order_id: request.order_id.clone(),
            application_id: request.application_id.clone(),
            payment_method: request.payment_method,
            amount: request.amount,
            currency: request.currency.clone(),
            status: response.status.clone(),
            provider_transaction_id: response.provider_transaction_id.clone(),
            redirect_url: response.redirect_url.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Persistence for payment records
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert(&self, record: PaymentRecord) -> PaymentResult<()>;

    async fn get(&self, payment_id: &str) -> PaymentResult<Option<PaymentRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::Customer;

    #[test]
    fn test_record_from_created() {
        let request = CreatePaymentRequest::new(
            "O1",
            Decimal::new(10000, 2),
            "CZK",
            PaymentMethod::ComGate,
            Customer::new("a@b.c"),
        );
        let response = CreatePaymentResponse {
            payment_id: "T1".to_string(),
            redirect_url: Some("https://pay.example/T1".to_string()),
            status: PaymentStatus::Pending,
            provider_transaction_id: "T1".to_string(),
        };

        let record = PaymentRecord::from_created(&request, &response);
        assert_ne!(record.payment_id, "T1");
        assert_eq!(record.provider_transaction_id, "T1");
        assert_eq!(record.status, PaymentStatus::Pending);
        assert_eq!(record.payment_method, PaymentMethod::ComGate);
    }
}
