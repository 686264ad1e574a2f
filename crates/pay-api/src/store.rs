//! In-process payment record store.
//!
//! Records live as long as the process; a restart forgets them. Nothing is
//! ever evicted, so this is a development default: deployments that run
//! for long should plug a persistent [`PaymentStore`] into `AppState`.

use async_trait::async_trait;
use pay_core::{PaymentError, PaymentRecord, PaymentResult, PaymentStore};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Unbounded map of payment id to record
#[derive(Debug, Default)]
pub struct InMemoryPaymentStore {
    records: RwLock<HashMap<String, PaymentRecord>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, record: PaymentRecord) -> PaymentResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.payment_id) {
            return Err(PaymentError::InvalidRequest(format!(
                "Duplicate payment id {}",
                record.payment_id
            )));
        }
        records.insert(record.payment_id.clone(), record);
        Ok(())
    }

    async fn get(&self, payment_id: &str) -> PaymentResult<Option<PaymentRecord>> {
        Ok(self.records.read().await.get(payment_id).cloned())
    }
}
