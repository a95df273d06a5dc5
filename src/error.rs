use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use crate::models::ApiResponse;
use crate::store::StoreError;

pub type AppResult<T> = Result<T, AppError>;

/// Coarse classification callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Infrastructure,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Storage error in {operation}: {source}")]
    StorageError {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ValidationError(_) | AppError::UnsupportedMediaType(_) => {
                ErrorKind::Validation
            }
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::StorageError { .. }
            | AppError::DatabaseError(_)
            | AppError::ConfigError(_) => ErrorKind::Infrastructure,
        }
    }

    /// Wraps a store failure; `NotFound` becomes a domain not-found.
    pub fn from_store(operation: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("Subscription not found".to_string()),
            source => AppError::StorageError { operation, source },
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, message) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                ("VALIDATION_ERROR", msg.clone())
            }
            AppError::UnsupportedMediaType(msg) => {
                log::warn!("Unsupported media type: {msg}");
                ("UNSUPPORTED_MEDIA_TYPE", msg.clone())
            }
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone()),
            AppError::StorageError { operation, source } => {
                log::error!("Storage error in {operation}: {source}");
                ("STORAGE_ERROR", "Storage error".to_string())
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                ("DATABASE_ERROR", "Database error".to_string())
            }
            AppError::ConfigError(msg) => {
                log::error!("Config error: {msg}");
                ("INTERNAL_ERROR", "Internal server error".to_string())
            }
        };

        HttpResponse::build(self.status_code())
            .json(ApiResponse::<()>::error(error_code, message))
    }
}
