use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::constants::ERR_DETAILS_UNAVAILABLE;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::error::EncodeError),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bincode::error::DecodeError),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Movie already exists for that year")]
    MovieAlreadyExists,

    #[error("Movie not found")]
    MovieNotFound,

    #[error("Account already exists")]
    AccountAlreadyExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Not allowed to modify the movie list")]
    Forbidden,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The metadata provider answered but reported no match; carries the
    /// provider's own message verbatim
    #[error("{0}")]
    DetailsNotFound(String),

    #[error("Metadata provider unavailable: {0}")]
    DetailsUnavailable(#[from] reqwest::Error),

    #[error("Malformed metadata payload: {0}")]
    DetailsMalformed(#[from] serde_json::Error),
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::Transaction(ref e) => {
                tracing::error!("Transaction error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::Table(ref e) => {
                tracing::error!("Table error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::Storage(ref e) => {
                tracing::error!("Storage error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::Commit(ref e) => {
                tracing::error!("Commit error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::Serialization(ref e) => {
                tracing::error!("Serialization error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::Deserialization(ref e) => {
                tracing::error!("Deserialization error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::TaskJoin(ref e) => {
                tracing::error!("Task join error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::MovieAlreadyExists => {
                (StatusCode::CONFLICT, "Movie already exists for that year")
            }
            AppError::MovieNotFound => (StatusCode::NOT_FOUND, "Movie not found"),
            AppError::AccountAlreadyExists => (StatusCode::CONFLICT, "Account already exists"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid email or password"),
            AppError::NotSignedIn => (StatusCode::UNAUTHORIZED, "Not signed in"),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Not allowed to modify the movie list",
            ),
            AppError::InvalidInput(ref msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::DetailsNotFound(ref msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::DetailsUnavailable(ref e) => {
                tracing::error!("Metadata provider error: {:?}", e);
                (StatusCode::BAD_GATEWAY, ERR_DETAILS_UNAVAILABLE)
            }
            AppError::DetailsMalformed(ref e) => {
                tracing::error!("Malformed metadata payload: {:?}", e);
                (StatusCode::BAD_GATEWAY, ERR_DETAILS_UNAVAILABLE)
            }
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
