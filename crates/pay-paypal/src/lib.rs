//! # pay-paypal
//!
//! PayPal Orders v2 adapter for the payment gateway.
//!
//! - OAuth client-credentials token per call (basic auth, not cached)
//! - Orders created with intent `CAPTURE`; the buyer follows the
//!   `payer-action`/`approve` link
//! - Refunds issued against the order's first capture
//! - Webhooks: HMAC-SHA256 of the raw body keyed by `PAYPAL_WEBHOOK_SECRET`

pub mod config;
pub mod orders;

pub use config::PayPalConfig;
pub use orders::PayPalProvider;
