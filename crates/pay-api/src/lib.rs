//! # pay-api
//!
//! HTTP front door for the payment gateway.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/` | Service info |
//! | POST | `/payments/create` | Create a payment |
//! | GET | `/payments/{payment_id}` | Stored record and live provider status |
//! | POST | `/payments/{payment_id}/refund` | Full or partial refund |
//! | POST | `/webhooks/{provider}` | Verify a provider notification |

pub mod handlers;
pub mod routes;
pub mod state;
pub mod store;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
pub use store::InMemoryPaymentStore;
