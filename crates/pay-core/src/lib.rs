//! # pay-core
//!
//! Core types and traits for the payment gateway.
//!
//! This crate provides:
//! - `PaymentProvider` trait implemented by every provider adapter
//! - `ProviderRegistry` for resolving adapters by payment method or webhook route
//! - Request/response contract types (`CreatePaymentRequest`, `RefundPaymentResponse`, ...)
//! - Minor-unit conversion helpers
//! - Sorted-key signing and HMAC helpers
//! - `PaymentStore` interface for payment records
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use pay_core::{CreatePaymentRequest, Customer, PaymentMethod, ProviderRegistry};
//!
//! let registry = ProviderRegistry::new()
//!     .with_provider(Arc::new(comgate))
//!     .with_provider(Arc::new(stripe));
//!
//! let request = CreatePaymentRequest::new("O1", amount, "CZK", PaymentMethod::ComGate, customer);
//! let response = registry.resolve(request.payment_method)?.create_payment(&request).await?;
//!
//! // Redirect the customer to response.redirect_url
//! ```

pub mod amount;
pub mod error;
pub mod payment;
pub mod provider;
pub mod signing;
pub mod store;

// Re-exports for convenience
pub use error::{PaymentError, PaymentResult};
pub use payment::{
    CreatePaymentRequest, CreatePaymentResponse, Customer, PaymentMethod, PaymentStatus,
    ProviderId, RefundPaymentRequest, RefundPaymentResponse, REFUND_PROCESSING,
};
pub use provider::{BoxedPaymentProvider, PaymentProvider, ProviderRegistry};
pub use rust_decimal::Decimal;
pub use signing::{HashAlgorithm, SignedParams, SortedKeySigner};
pub use store::{PaymentRecord, PaymentStore};
