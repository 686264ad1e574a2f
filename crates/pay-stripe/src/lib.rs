//! # pay-stripe
//!
//! Stripe adapter for the payment gateway.
//!
//! - Payments are created as PaymentIntents (`/v1/payment_intents`),
//!   amounts converted to minor units, order id and callback URL attached
//!   as metadata.
//! - Refunds go through the intent's latest charge (`/v1/refunds`).
//! - Webhooks are checked against the `Stripe-Signature` envelope
//!   (HMAC-SHA256 with a timestamp tolerance window).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pay_stripe::StripeProvider;
//! use pay_core::PaymentProvider;
//!
//! let stripe = StripeProvider::from_env()?;
//! let response = stripe.create_payment(&request).await?;
//! // Hand response.payment_id to the frontend for confirmation
//! ```

pub mod config;
pub mod intents;
pub mod webhook;

// Re-exports
pub use config::StripeConfig;
pub use intents::StripeProvider;
pub use webhook::{compute_signature, SignatureHeader};
