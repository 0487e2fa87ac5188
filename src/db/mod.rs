pub mod memory;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson};
use mongodb::{Client, Collection, Database as MongoDatabase};
use tracing::{debug, error, info};

use crate::balance;
use crate::error::{StoreError, StoreResult};
use crate::models::transaction::Transaction;
use crate::models::Balances;

/// Storage handle shared by the ingest and balance paths.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Writes all records in a single bulk insert and returns them with
    /// their assigned ids.
    async fn insert_many(&self, records: Vec<Transaction>) -> StoreResult<Vec<Transaction>>;

    /// Net amount per market over records with `UTC_Time <= cutoff`.
    async fn net_balances(&self, cutoff: &str) -> StoreResult<Balances>;
}

pub struct Database {
    _client: Client,
    database: MongoDatabase,
    collection_name: String,
}

impl Database {
    pub async fn new(database_url: &str, database_name: &str, collection_name: &str) -> StoreResult<Self> {
        info!("Connecting to MongoDB: database={}, collection={}", database_name, collection_name);
        let client = Client::with_uri_str(database_url)
            .await
            .map_err(|e| StoreError::Connectivity(e.to_string()))?;
        let database = client.database(database_name);

        // 接続テスト
        if let Err(e) = database.run_command(doc! { "ping": 1 }).await {
            error!("Database ping failed: {}", e);
            return Err(StoreError::Connectivity(e.to_string()));
        }
        info!("Database initialized: database={}, status=connected", database.name());

        Ok(Self {
            _client: client,
            database,
            collection_name: collection_name.to_string(),
        })
    }

    fn transactions(&self) -> Collection<Transaction> {
        self.database.collection::<Transaction>(&self.collection_name)
    }
}

#[async_trait]
impl TransactionStore for Database {
    async fn insert_many(&self, mut records: Vec<Transaction>) -> StoreResult<Vec<Transaction>> {
        if records.is_empty() {
            // 空のinsert_manyはドライバがエラーにするので何もしない
            return Ok(records);
        }

        debug!("Attempting bulk insert: collection={}, rows={}", self.collection_name, records.len());
        let result = match self.transactions().insert_many(&records).await {
            Ok(result) => result,
            Err(e) => {
                error!("Failed to insert transactions: {}", e);
                return Err(StoreError::BulkWrite(e.to_string()));
            }
        };

        for (index, id) in result.inserted_ids {
            if let (Some(record), Bson::ObjectId(oid)) = (records.get_mut(index), id) {
                record.id = Some(oid);
            }
        }
        info!("Inserted {} transactions into {}", records.len(), self.collection_name);
        Ok(records)
    }

    async fn net_balances(&self, cutoff: &str) -> StoreResult<Balances> {
        let pipeline = balance::pipeline(cutoff);
        debug!("Running balance pipeline: {}", serde_json::to_string(&pipeline).unwrap_or_default());

        let mut cursor = self
            .transactions()
            .aggregate(pipeline)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        match cursor.try_next().await {
            Ok(Some(doc)) => balance::balances_from_document(doc),
            Ok(None) => Ok(Balances::new()),
            Err(e) => {
                error!("Balance query failed: {}", e);
                Err(StoreError::Query(e.to_string()))
            }
        }
    }
}
