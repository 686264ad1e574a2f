//! # pay-payu
//!
//! PayU adapter for the payment gateway.
//!
//! - OAuth client-credentials token fetched before every call (no caching)
//! - Orders created on `/api/v2_1/orders`, amounts in minor units
//! - Outbound `signature`: SHA-256 over sorted, flattened order fields plus
//!   the client secret
//! - Refunds default to the order's reported `totalAmount`

pub mod config;
pub mod orders;

pub use config::PayUConfig;
pub use orders::PayUProvider;
