//! Transfer HTTP handlers.
//!
//! This module implements transfer-related API endpoints:
//! - POST /api/v1/transfers - Move money between two of the user's cards
//! - GET /api/v1/transfers - List the user's transfers
//! - GET /api/v1/transfers/:id - Get transfer details

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::AuthUser,
    models::transfer::{ListTransfersQuery, TransferRequest, TransferResponse},
    services::transfer_service,
    state::AppState,
};

/// Transfer money between two of the authenticated user's cards.
///
/// # Request Body
///
/// ```json
/// {
///   "from_card_id": "550e8400-...",
///   "to_card_id": "660e8400-...",
///   "amount_cents": 10000,
///   "description": "Topping up the travel card",
///   "cvv": "123"
/// }
/// ```
///
/// # Atomicity
///
/// Both card balances and the transfer record are written in a single
/// database transaction. Either everything persists or nothing does.
///
/// # Validation
///
/// - Both cards must belong to the authenticated user
/// - Both cards must be active
/// - Source must have sufficient balance
/// - Cards must be different
/// - `cvv`, if supplied, must match the source card's CVV
pub async fn create_transfer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, AppError> {
    let response =
        transfer_service::execute_transfer(&state.pool, &state.cipher, &auth, request).await?;
    Ok(Json(response))
}

/// Get transfer by ID.
///
/// # Security
///
/// Returns 404 if the transfer doesn't involve any card belonging to the
/// authenticated user.
pub async fn get_transfer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(transfer_id): Path<Uuid>,
) -> Result<Json<TransferResponse>, AppError> {
    let response =
        transfer_service::get_transfer(&state.pool, &state.cipher, &auth, transfer_id).await?;
    Ok(Json(response))
}

/// List the authenticated user's transfers, newest first.
///
/// # Query Parameters
///
/// - `card_id` (optional): only transfers touching this card
/// - `limit` (optional, default 50, max 100)
/// - `offset` (optional, default 0)
pub async fn list_transfers(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ListTransfersQuery>,
) -> Result<Json<Vec<TransferResponse>>, AppError> {
    let responses =
        transfer_service::list_transfers(&state.pool, &state.cipher, &auth, &query).await?;
    Ok(Json(responses))
}
