use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::Mutex;
use tracing::debug;

use super::TransactionStore;
use crate::balance;
use crate::error::StoreResult;
use crate::models::transaction::Transaction;
use crate::models::Balances;

/// Process-local store with the same netting semantics as MongoDB.
/// Backs the loader's dry-run mode.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<Transaction>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn insert_many(&self, mut records: Vec<Transaction>) -> StoreResult<Vec<Transaction>> {
        for record in records.iter_mut() {
            record.id = Some(ObjectId::new());
        }
        let mut stored = self.records.lock().await;
        stored.extend(records.iter().cloned());
        debug!("Dummy mode, kept {} transactions in memory (total {})", records.len(), stored.len());
        Ok(records)
    }

    async fn net_balances(&self, cutoff: &str) -> StoreResult<Balances> {
        let stored = self.records.lock().await;
        Ok(balance::net_balances(stored.iter(), cutoff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::operation::Operation;
    use crate::models::transaction::Field;

    fn trade(time: &str, market: &str, op: Operation, amount: f64) -> Transaction {
        Transaction {
            utc_time: Some(time.to_string()),
            market: Some(market.to_string()),
            operation: Some(op),
            amount: Some(Field::Value(amount)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn assigns_ids_on_insert() {
        let store = MemoryStore::new();
        let inserted = store
            .insert_many(vec![trade("2022-01-01", "BTC", Operation::Buy, 1.0); 2])
            .await
            .unwrap();
        assert_eq!(inserted.len(), 2);
        assert!(inserted.iter().all(|t| t.id.is_some()));
        assert_ne!(inserted[0].id, inserted[1].id);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn duplicate_uploads_accumulate() {
        let store = MemoryStore::new();
        let batch = vec![trade("2022-01-01", "BTC", Operation::Buy, 2.0)];
        store.insert_many(batch.clone()).await.unwrap();
        store.insert_many(batch).await.unwrap();
        let balances = store.net_balances("2022-12-31").await.unwrap();
        assert_eq!(balances["BTC"], 4.0);
    }

    #[tokio::test]
    async fn empty_insert_is_a_no_op() {
        let store = MemoryStore::new();
        let inserted = store.insert_many(Vec::new()).await.unwrap();
        assert!(inserted.is_empty());
        assert!(store.is_empty().await);
    }
}
