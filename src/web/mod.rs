//! HTTP boundary: `POST /upload_file` and `GET /balance`.

pub mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::TransactionStore;
use crate::ingest::ingest;
use crate::models::Balances;
use error::ApiError;

/// Upper bound on an uploaded CSV.
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

pub struct AppState {
    pub store: Arc<dyn TransactionStore>,
    pub upload_dir: PathBuf,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/upload_file", post(upload_file))
        .route("/balance", get(balance))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(Arc::new(state))
}

async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Multipart(e.to_string()))?
    {
        // ファイル以外のフィールドは無視
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let contents = field
            .bytes()
            .await
            .map_err(|e| ApiError::Multipart(e.to_string()))?;
        upload = Some((file_name, contents));
        break;
    }
    let (file_name, contents) = upload.ok_or(ApiError::MissingFile)?;

    let staged = stage_upload(&state.upload_dir, &file_name, &contents).await?;
    info!("Staged upload {} ({} bytes)", staged.display(), contents.len());

    let ingested = ingest(state.store.as_ref(), &contents[..])
        .await
        .map_err(ApiError::Insert)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Transactions inserted successfully",
            "data": ingested.records,
        })),
    ))
}

/// Writes the upload under a per-request unique name inside `upload_dir`.
async fn stage_upload(upload_dir: &Path, file_name: &str, contents: &[u8]) -> Result<PathBuf, ApiError> {
    tokio::fs::create_dir_all(upload_dir).await?;
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.csv");
    let path = upload_dir.join(format!("{}-{}", Uuid::new_v4(), base));
    tokio::fs::write(&path, contents).await?;
    Ok(path)
}

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub timestamp: Option<String>,
}

async fn balance(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<Balances>, ApiError> {
    let cutoff = query
        .timestamp
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::MissingTimestamp)?;
    debug!("Computing balances up to {}", cutoff);

    let balances = state
        .store
        .net_balances(&cutoff)
        .await
        .map_err(ApiError::Balance)?;
    Ok(Json(balances))
}
