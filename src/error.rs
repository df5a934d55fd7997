//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::HolderError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error(transparent)]
    Holder(#[from] HolderError),

    // Store errors - map to appropriate HTTP status
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::Holder(e) => (
                StatusCode::BAD_REQUEST,
                "invalid_holder_name",
                Some(e.to_string()),
            ),

            AppError::Store(ref store_err) => match store_err {
                StoreError::DuplicateAccount {
                    first_name,
                    last_name,
                } => (
                    StatusCode::CONFLICT,
                    "duplicate_account",
                    Some(format!("{} {}", first_name, last_name)),
                ),
                StoreError::NotFound(id) => (
                    StatusCode::NOT_FOUND,
                    "account_not_found",
                    Some(id.to_string()),
                ),
                StoreError::InvalidTransfer(msg) => {
                    (StatusCode::BAD_REQUEST, "invalid_transfer", Some(msg.clone()))
                }
                StoreError::InsufficientFunds { .. } => (
                    StatusCode::BAD_REQUEST,
                    "insufficient_funds",
                    Some(store_err.to_string()),
                ),

                // 500 Internal Server Error
                StoreError::WriteIntegrity { .. } => {
                    tracing::error!("Write integrity violation: {}", store_err);
                    (StatusCode::INTERNAL_SERVER_ERROR, "write_integrity", None)
                }
                StoreError::TransferAtomicity(_) => {
                    tracing::error!("Transfer atomicity violation: {}", store_err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "transfer_atomicity",
                        None,
                    )
                }
                StoreError::Database(e) => {
                    tracing::error!("Database error: {:?}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
                }
            },
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_client_errors_map_to_4xx() {
        assert_eq!(
            status_of(AppError::Holder(HolderError::Blank)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Store(StoreError::NotFound(7))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Store(StoreError::DuplicateAccount {
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::Store(StoreError::InsufficientFunds {
                required: 100.0,
                available: 10.0,
            })),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Store(StoreError::InvalidTransfer(
                "same account".to_string()
            ))),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_integrity_errors_map_to_500() {
        assert_eq!(
            status_of(AppError::Store(StoreError::WriteIntegrity {
                expected: 1,
                affected: 2,
            })),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AppError::Store(StoreError::TransferAtomicity(
                "debit affected 0 rows".to_string()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
