use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Args;

pub const DEFAULT_DATABASE: &str = "tradebook";
pub const DEFAULT_COLLECTION: &str = "transactions";

/// Storage options shared by every binary.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Database URL (or use MONGODB_URL env var)
    #[arg(short, long)]
    pub database_url: Option<String>,

    /// Database name
    #[arg(long, default_value = DEFAULT_DATABASE)]
    pub database: String,

    /// Collection holding the transactions
    #[arg(long, default_value = DEFAULT_COLLECTION)]
    pub collection: String,
}

impl StoreArgs {
    /// Flag value first, then `MONGODB_URL`.
    pub fn resolve_database_url(&self) -> Result<String> {
        self.database_url
            .clone()
            .or_else(|| env::var("MONGODB_URL").ok())
            .ok_or_else(|| anyhow!("MONGODB_URL must be set (or pass --database-url)"))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database: String,
    pub collection: String,
    pub upload_dir: PathBuf,
    pub bind: SocketAddr,
}

impl Config {
    pub fn new(store: &StoreArgs, upload_dir: PathBuf, bind: SocketAddr) -> Result<Self> {
        Ok(Self {
            database_url: store.resolve_database_url()?,
            database: store.database.clone(),
            collection: store.collection.clone(),
            upload_dir,
            bind,
        })
    }
}

/// Loads `.env` and the `credentials.env` file older deployments used.
pub fn load_env() {
    dotenv::dotenv().ok();
    dotenv::from_filename("credentials.env").ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_url_wins() {
        let args = StoreArgs {
            database_url: Some("mongodb://example:27017".to_string()),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
        };
        let config = Config::new(&args, PathBuf::from("uploads"), "127.0.0.1:4000".parse().unwrap()).unwrap();
        assert_eq!(config.database_url, "mongodb://example:27017");
        assert_eq!(config.collection, "transactions");
        assert_eq!(config.bind.port(), 4000);
    }
}
