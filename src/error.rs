//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error message.
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error from database operations
/// - **Authentication/Authorization Errors**: Invalid tokens, missing admin rights
/// - **Resource Errors**: Cards, transfers, or block requests not found
/// - **Business Logic Errors**: Transfer rule violations, insufficient funds
/// - **Cipher Errors**: Failures on the encrypt path (never the decrypt path,
///   which degrades to passthrough instead)
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    ///
    /// This wraps any sqlx::Error using the `#[from]` attribute, which
    /// automatically implements `From<sqlx::Error> for AppError`.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Bearer token is missing, unknown, or revoked.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid authentication token")]
    Unauthorized,

    /// Authenticated user lacks admin rights for this operation.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Admin access required")]
    Forbidden,

    /// Requested card does not exist or doesn't belong to the acting user.
    ///
    /// Returns HTTP 404 Not Found. Ownership failures on lookup use the
    /// same variant so the existence of other users' cards never leaks.
    #[error("Card not found")]
    CardNotFound,

    /// Requested transfer does not exist or involves none of the acting
    /// user's cards.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Transfer not found")]
    TransferNotFound,

    /// Requested block request does not exist.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Block request not found")]
    BlockRequestNotFound,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// Transfer violates a business rule: same card on both sides, a card
    /// not owned by the acting user, an inactive card, or a CVV mismatch.
    ///
    /// Returns HTTP 400 Bad Request. Distinct from `InsufficientFunds` so
    /// clients can differentiate.
    #[error("Invalid transfer")]
    InvalidTransfer(String),

    /// Source card has insufficient balance for the requested transfer.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Insufficient funds")]
    InsufficientFunds,

    /// Card data encryption failed.
    ///
    /// Returns HTTP 500 Internal Server Error. Indicates a misconfigured
    /// cipher environment; never retried and never swallowed.
    #[error("Encryption failure")]
    Encryption(String),
}

/// Convert AppError into an HTTP response.
///
/// This implementation allows Axum handlers to return `Result<T, AppError>`
/// and have errors automatically converted to proper HTTP responses.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map each error variant to (HTTP status, error code, message)
        let (status, code, message) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string()),
            AppError::CardNotFound => (StatusCode::NOT_FOUND, "card_not_found", self.to_string()),
            AppError::TransferNotFound => {
                (StatusCode::NOT_FOUND, "transfer_not_found", self.to_string())
            }
            AppError::BlockRequestNotFound => (
                StatusCode::NOT_FOUND,
                "block_request_not_found",
                self.to_string(),
            ),
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::InvalidTransfer(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_transfer", msg.clone())
            }
            AppError::InsufficientFunds => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "insufficient_funds",
                self.to_string(),
            ),
            AppError::Encryption(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "encryption_failure",
                "An internal error occurred".to_string(),
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
            ),
        };

        // Build JSON response body
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        // Return the response with status code and JSON body
        (status, body).into_response()
    }
}
