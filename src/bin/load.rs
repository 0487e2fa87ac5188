use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tradebook::{
    config::{self, StoreArgs},
    db::{memory::MemoryStore, Database, TransactionStore},
    ingest::ingest,
};

#[derive(Parser, Debug)]
#[command(name = "load")]
#[command(about = "Load a CSV file of trades through the ingest pipeline", long_about = None)]
struct Args {
    /// CSV file with a header row (User_ID,UTC_Time,Operation,Market,Buy/Sell Amount,Price)
    file: PathBuf,

    #[command(flatten)]
    store: StoreArgs,

    /// Update database (if not set, rows are only kept in memory)
    #[arg(long)]
    update: bool,

    /// Print balances up to this timestamp after loading ("now" for the current UTC time as RFC 3339, e.g. 2022-01-31T00:00:00Z)
    #[arg(long)]
    at: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tradebook=info,load=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load .env file
    config::load_env();

    let args = Args::parse();

    let store: Arc<dyn TransactionStore> = if args.update {
        let database_url = args.store.resolve_database_url()?;
        Arc::new(Database::new(&database_url, &args.store.database, &args.store.collection).await?)
    } else {
        info!("Database initialized (dummy connection)");
        Arc::new(MemoryStore::new())
    };

    let file = File::open(&args.file).with_context(|| format!("Failed to open {}", args.file.display()))?;
    let ingested = ingest(store.as_ref(), BufReader::new(file)).await?;
    println!("[LOAD] {} transactions inserted from {}", ingested.inserted_count, args.file.display());

    if let Some(at) = args.at {
        let cutoff = if at == "now" { now_cutoff() } else { at };
        let balances = store.net_balances(&cutoff).await?;
        println!("[BALANCE] up to {}", cutoff);
        println!("{}", serde_json::to_string_pretty(&balances)?);
    }

    Ok(())
}

/// Current UTC time in the `2022-01-31T00:00:00Z` form the trade files use.
fn now_cutoff() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_cutoff_covers_todays_iso_trades() {
        let now = now_cutoff();
        assert!(now.ends_with('Z'));
        assert_eq!(now.as_bytes()[10], b'T');

        // 今日の00:00:00Zの取引は含まれる
        let midnight = format!("{}T00:00:00Z", &now[..10]);
        assert!(midnight.as_str() <= now.as_str());
    }
}
