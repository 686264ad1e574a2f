//! # pay-fiobanka
//!
//! Fio banka adapter. Payments are plain bank transfers initiated from a
//! QR code (SPAYD); settlement is detected by scanning the account statement
//! for the payment's variable symbol.

pub mod config;
pub mod payments;
pub mod spayd;
pub mod statement;

pub use config::FioBankaConfig;
pub use payments::FioBankaProvider;
