//! Admin HTTP handlers.
//!
//! This module implements admin-only endpoints:
//! - GET /api/v1/admin/block-requests - List block requests
//! - POST /api/v1/admin/block-requests/:id/approve - Approve (blocks the card)
//! - POST /api/v1/admin/block-requests/:id/reject - Reject (card unchanged)
//! - POST /api/v1/admin/cards/:id/block - Block a card directly
//! - POST /api/v1/admin/cards/:id/activate - Activate a card directly
//!
//! Every handler gates on `AuthUser::require_admin` before doing anything.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::AuthUser,
    models::block_request::{CardBlockRequest, ListBlockRequestsQuery, ProcessBlockRequest},
    models::card::CardResponse,
    services::card_service::{self, StatusAction},
    state::AppState,
};

/// List block requests, optionally filtered by status.
///
/// # Query Parameters
///
/// - `status` (optional): `PENDING`, `APPROVED`, or `REJECTED`
pub async fn list_block_requests(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ListBlockRequestsQuery>,
) -> Result<Json<Vec<CardBlockRequest>>, AppError> {
    auth.require_admin()?;

    let requests = card_service::list_block_requests(&state.pool, &query).await?;
    Ok(Json(requests))
}

/// Approve a pending block request. The referenced card becomes BLOCKED in
/// the same database transaction that marks the request APPROVED.
pub async fn approve_block_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<ProcessBlockRequest>,
) -> Result<Json<CardBlockRequest>, AppError> {
    auth.require_admin()?;

    let request =
        card_service::process_block_request(&state.pool, &auth, request_id, true, body.admin_comment)
            .await?;
    Ok(Json(request))
}

/// Reject a pending block request. The referenced card is left unchanged.
pub async fn reject_block_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<ProcessBlockRequest>,
) -> Result<Json<CardBlockRequest>, AppError> {
    auth.require_admin()?;

    let request = card_service::process_block_request(
        &state.pool,
        &auth,
        request_id,
        false,
        body.admin_comment,
    )
    .await?;
    Ok(Json(request))
}

/// Block a card directly, without a user request.
pub async fn block_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(card_id): Path<Uuid>,
) -> Result<Json<CardResponse>, AppError> {
    auth.require_admin()?;

    let card = card_service::set_card_status(&state.pool, card_id, StatusAction::Block).await?;
    Ok(Json(card.to_response(&state.cipher)))
}

/// Set a card's stored status back to ACTIVE.
///
/// Note this is the unguarded transition: an expired card "activates" at
/// the stored level but still refuses transfers via the date check.
pub async fn activate_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(card_id): Path<Uuid>,
) -> Result<Json<CardResponse>, AppError> {
    auth.require_admin()?;

    let card = card_service::set_card_status(&state.pool, card_id, StatusAction::Activate).await?;
    Ok(Json(card.to_response(&state.cipher)))
}
