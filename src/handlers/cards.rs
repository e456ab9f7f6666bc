//! Card management HTTP handlers.
//!
//! This module implements the card-related API endpoints:
//! - POST /api/v1/cards - Issue a new card
//! - GET /api/v1/cards - List the authenticated user's cards
//! - GET /api/v1/cards/:id - Get a card by ID
//! - POST /api/v1/cards/:id/block-request - Ask for a card to be blocked
//!
//! Card numbers only ever appear masked in responses; CVVs never appear.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::AuthUser,
    models::block_request::{CardBlockRequest, CreateBlockRequest},
    models::card::{CardResponse, CreateCardRequest},
    services::card_service,
    state::AppState,
};

/// Issue a new card for the authenticated user.
///
/// # Endpoint
///
/// `POST /api/v1/cards`
///
/// # Request Body
///
/// ```json
/// {
///   "holder_name": "JANE DOE",
///   "expiration_date": "2030-06-30",
///   "initial_balance_cents": 100000
/// }
/// ```
///
/// # Response (200)
///
/// ```json
/// {
///   "id": "550e8400-...",
///   "masked_number": "**** **** **** 1234",
///   "holder_name": "JANE DOE",
///   "expiration": "06/30",
///   "balance_cents": 100000,
///   "status": "ACTIVE",
///   "created_at": "2026-08-01T10:00:00Z"
/// }
/// ```
///
/// The card number and CVV are generated server-side and stored encrypted;
/// neither is returned in full.
pub async fn create_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreateCardRequest>,
) -> Result<Json<CardResponse>, AppError> {
    let response = card_service::create_card(&state.pool, &state.cipher, &auth, request).await?;
    Ok(Json(response))
}

/// List all cards belonging to the authenticated user.
///
/// Cards are returned in reverse chronological order (newest first), with
/// masked numbers only.
pub async fn list_cards(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<CardResponse>>, AppError> {
    let cards = card_service::list_cards(&state.pool, &auth).await?;

    let responses = cards
        .iter()
        .map(|card| card.to_response(&state.cipher))
        .collect();

    Ok(Json(responses))
}

/// Get a specific card by ID.
///
/// # Security Note
///
/// The lookup filters by BOTH id AND owner, so users can only see their own
/// cards and cannot probe for the existence of others'.
pub async fn get_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(card_id): Path<Uuid>,
) -> Result<Json<CardResponse>, AppError> {
    let card = card_service::get_card(&state.pool, &auth, card_id).await?;
    Ok(Json(card.to_response(&state.cipher)))
}

/// Submit a block request for one of the authenticated user's cards.
///
/// # Request Body
///
/// ```json
/// {
///   "reason": "Card was lost on the train"
/// }
/// ```
///
/// The request starts PENDING; an admin later approves (blocking the card)
/// or rejects it.
pub async fn create_block_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(card_id): Path<Uuid>,
    Json(request): Json<CreateBlockRequest>,
) -> Result<Json<CardBlockRequest>, AppError> {
    let block_request =
        card_service::create_block_request(&state.pool, &auth, card_id, request.reason).await?;
    Ok(Json(block_request))
}
