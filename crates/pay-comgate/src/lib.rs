//! # pay-comgate
//!
//! ComGate adapter: form-encoded requests, MD5 sorted-key `hash` on every
//! call, hosted redirect page.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pay_comgate::{ComGateConfig, ComGateProvider};
//!
//! let provider = ComGateProvider::new(ComGateConfig::from_env()?)?;
//! let response = provider.create_payment(&request).await?;
//! ```

pub mod config;
pub mod form;
pub mod payments;

pub use config::ComGateConfig;
pub use payments::ComGateProvider;
