//! # Payment Provider Trait
//!
//! The capability interface every provider adapter implements, and the
//! registry that selects an adapter by payment method or webhook route.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  PaymentProvider (trait)                    │
//! │  ├── create_payment()                                       │
//! │  ├── get_payment_status()                                   │
//! │  ├── refund_payment()                                       │
//! │  └── verify_webhook_signature()  -> bool, never fails       │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!     ┌──────────┬───────────┼───────────┬──────────┐
//!     │          │           │           │          │
//!  Stripe      PayU       ComGate    FioBanka    PayPal
//! ```

use crate::error::{PaymentError, PaymentResult};
use crate::payment::{
    CreatePaymentRequest, CreatePaymentResponse, PaymentMethod, ProviderId, RefundPaymentRequest,
    RefundPaymentResponse,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Core trait for payment provider adapters.
///
/// Adapters hold read-only configuration only; every call is an
/// independent outbound request.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a payment with the provider.
    ///
    /// Amounts arrive in major units; the adapter converts to the
    /// provider's native representation.
    async fn create_payment(
        &self,
        request: &CreatePaymentRequest,
    ) -> PaymentResult<CreatePaymentResponse>;

    /// Query the provider for a transaction.
    ///
    /// Returns the provider-native payload without normalization.
    async fn get_payment_status(&self, provider_transaction_id: &str) -> PaymentResult<Value>;

    /// Refund a payment, fully when `request.amount` is `None`.
    ///
    /// Adapters that read the current state first do so without any lock:
    /// a status change between the query and the refund is not detected.
    async fn refund_payment(
        &self,
        request: &RefundPaymentRequest,
    ) -> PaymentResult<RefundPaymentResponse>;

    /// Check a webhook signature.
    ///
    /// Must not fail: malformed input, a missing secret or any internal
    /// error is reported as `false`.
    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> bool;

    /// Provider this adapter speaks to (for logging and routing)
    fn provider_id(&self) -> ProviderId;
}

/// Type alias for a shared provider adapter (dynamic dispatch)
pub type BoxedPaymentProvider = Arc<dyn PaymentProvider>;

/// Registration table mapping providers to adapter instances.
///
/// Built once at startup; payment methods resolve through
/// [`PaymentMethod::provider`], so `card` and `stripe` share one adapter.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderId, BoxedPaymentProvider>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own provider id, replacing any previous one
    pub fn register(&mut self, provider: BoxedPaymentProvider) {
        self.providers.insert(provider.provider_id(), provider);
    }

    /// Register with builder pattern
    pub fn with_provider(mut self, provider: BoxedPaymentProvider) -> Self {
        self.register(provider);
        self
    }

    /// Adapter for a payment method
    pub fn resolve(&self, method: PaymentMethod) -> PaymentResult<&BoxedPaymentProvider> {
        self.providers
            .get(&method.provider())
            .ok_or_else(|| PaymentError::unsupported(method.as_str()))
    }

    /// Adapter for a payment method given by name
    pub fn resolve_str(&self, method: &str) -> PaymentResult<&BoxedPaymentProvider> {
        self.resolve(method.parse()?)
    }

    /// Adapter for a webhook route id
    pub fn resolve_webhook(&self, provider_id: &str) -> PaymentResult<&BoxedPaymentProvider> {
        let id: ProviderId = provider_id.parse()?;
        self.providers
            .get(&id)
            .ok_or_else(|| PaymentError::unsupported(id.as_str()))
    }

    /// Verify an inbound webhook for the provider named by the route.
    ///
    /// Fails only when no adapter serves the route; signature problems are `Ok(false)`.
    pub fn verify_webhook(
        &self,
        provider_id: &str,
        payload: &[u8],
        signature: &str,
    ) -> PaymentResult<bool> {
        let provider = self.resolve_webhook(provider_id)?;
        let valid = provider.verify_webhook_signature(payload, signature);
        if !valid {
            warn!(provider = %provider.provider_id(), "Rejected webhook signature");
        }
        Ok(valid)
    }

    /// Registered provider ids
    pub fn providers(&self) -> Vec<ProviderId> {
        let mut ids: Vec<_> = self.providers.keys().copied().collect();
        ids.sort_by_key(|id| id.as_str());
        ids
    }

    /// Check if a provider is registered
    pub fn has_provider(&self, provider: ProviderId) -> bool {
        self.providers.contains_key(&provider)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}
