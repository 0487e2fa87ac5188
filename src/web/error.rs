use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::error::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No file was uploaded")]
    MissingFile,
    #[error("Invalid multipart body: {0}")]
    Multipart(String),
    #[error("Failed to stage uploaded file")]
    Staging(#[from] std::io::Error),
    #[error("Failed to insert transactions")]
    Insert(#[source] StoreError),
    #[error("Query parameter 'timestamp' is required")]
    MissingTimestamp,
    #[error("Failed to compute balances")]
    Balance(#[source] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFile | ApiError::Multipart(_) | ApiError::MissingTimestamp => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Staging(_) | ApiError::Insert(_) | ApiError::Balance(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            match std::error::Error::source(&self) {
                Some(cause) => error!("{}: {}", self, cause),
                None => error!("{}", self),
            }
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
