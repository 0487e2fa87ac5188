use anyhow::Result;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tradebook::{
    config::{self, Config, StoreArgs},
    db::Database,
    web::{self, AppState},
};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Accept CSV trade uploads and report per-market balances", long_about = None)]
struct Args {
    #[command(flatten)]
    store: StoreArgs,

    /// Directory where uploaded files are staged
    #[arg(long, default_value = "uploads")]
    upload_dir: PathBuf,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value = "4000")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tradebook=info,server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load .env file
    config::load_env();

    let args = Args::parse();
    let config = Config::new(&args.store, args.upload_dir, SocketAddr::new(args.host, args.port))?;

    // DB接続できなければ起動しない
    let database = match Database::new(&config.database_url, &config.database, &config.collection).await {
        Ok(database) => database,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    let app = web::router(AppState {
        store: Arc::new(database),
        upload_dir: config.upload_dir.clone(),
    });

    let listener = TcpListener::bind(config.bind).await?;
    info!("Listening on {} (uploads staged in {})", config.bind, config.upload_dir.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
