//! Card service - card issuance, lookup, and the block-request workflow.
//!
//! Card numbers and CVVs are generated server-side, encrypted immediately,
//! and stored only in encrypted form. The one moment the raw number exists
//! outside the codec is inside `create_card`, where it is masked for the
//! response and then dropped.

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use crate::{
    crypto::{codec::CardCipher, masking},
    db::DbPool,
    error::AppError,
    middleware::auth::AuthUser,
    models::block_request::{BlockRequestStatus, CardBlockRequest, ListBlockRequestsQuery},
    models::card::{Card, CardResponse, CardStatus, CreateCardRequest},
};

/// Issue a new card for the acting user.
///
/// The generated number is masked directly (raw-string path, no decrypt
/// round-trip) for the response; only the encrypted forms are persisted.
pub async fn create_card(
    pool: &DbPool,
    cipher: &CardCipher,
    user: &AuthUser,
    request: CreateCardRequest,
) -> Result<CardResponse, AppError> {
    if request.initial_balance_cents < 0 {
        return Err(AppError::InvalidRequest(
            "Initial balance must not be negative".to_string(),
        ));
    }
    if request.expiration_date <= Utc::now().date_naive() {
        return Err(AppError::InvalidRequest(
            "Expiration date must be in the future".to_string(),
        ));
    }

    let number = generate_digits(16);
    let cvv = generate_digits(3);

    let number_encrypted = cipher.encrypt(&number)?;
    let cvv_encrypted = cipher.encrypt(&cvv)?;

    let card = sqlx::query_as::<_, Card>(
        r#"
        INSERT INTO cards (user_id, number_encrypted, cvv_encrypted, holder_name,
                           expiration_date, balance_cents)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(number_encrypted)
    .bind(cvv_encrypted)
    .bind(request.holder_name)
    .bind(request.expiration_date)
    .bind(request.initial_balance_cents)
    .fetch_one(pool)
    .await?;

    tracing::info!(card_id = %card.id, user_id = %user.id, "card issued");

    // Mask from the raw number still in hand; avoids a decrypt round-trip.
    let mut response = card.to_response(cipher);
    response.masked_number = masking::mask_number(&number);
    Ok(response)
}

/// Get one of the acting user's cards.
///
/// Filters by both id and owner, so other users' cards are
/// indistinguishable from missing ones.
pub async fn get_card(pool: &DbPool, user: &AuthUser, card_id: Uuid) -> Result<Card, AppError> {
    sqlx::query_as::<_, Card>("SELECT * FROM cards WHERE id = $1 AND user_id = $2")
        .bind(card_id)
        .bind(user.id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::CardNotFound)
}

/// List the acting user's cards, newest first.
pub async fn list_cards(pool: &DbPool, user: &AuthUser) -> Result<Vec<Card>, AppError> {
    let cards = sqlx::query_as::<_, Card>(
        "SELECT * FROM cards WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(pool)
    .await?;

    Ok(cards)
}

/// Submit a block request for one of the acting user's cards.
pub async fn create_block_request(
    pool: &DbPool,
    user: &AuthUser,
    card_id: Uuid,
    reason: String,
) -> Result<CardBlockRequest, AppError> {
    if reason.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "A reason is required".to_string(),
        ));
    }

    // Ownership check doubles as the existence check.
    let card = get_card(pool, user, card_id).await?;

    let request = sqlx::query_as::<_, CardBlockRequest>(
        r#"
        INSERT INTO card_block_requests (card_id, user_id, reason)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(card.id)
    .bind(user.id)
    .bind(reason)
    .fetch_one(pool)
    .await?;

    Ok(request)
}

/// List block requests for admins, optionally filtered by status.
pub async fn list_block_requests(
    pool: &DbPool,
    query: &ListBlockRequestsQuery,
) -> Result<Vec<CardBlockRequest>, AppError> {
    let requests = sqlx::query_as::<_, CardBlockRequest>(
        r#"
        SELECT * FROM card_block_requests
        WHERE ($1::block_request_status IS NULL OR status = $1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(query.status)
    .fetch_all(pool)
    .await?;

    Ok(requests)
}

/// Process a pending block request.
///
/// Approval blocks the card and marks the request APPROVED in one database
/// transaction; rejection only marks the request. A request that is no
/// longer PENDING cannot be processed again.
pub async fn process_block_request(
    pool: &DbPool,
    admin: &AuthUser,
    request_id: Uuid,
    approve: bool,
    admin_comment: Option<String>,
) -> Result<CardBlockRequest, AppError> {
    let mut tx = pool.begin().await?;

    // Lock the request row so two admins cannot process it concurrently.
    let request = sqlx::query_as::<_, CardBlockRequest>(
        "SELECT * FROM card_block_requests WHERE id = $1 FOR UPDATE",
    )
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::BlockRequestNotFound)?;

    if request.status != BlockRequestStatus::Pending {
        tx.rollback().await?;
        return Err(AppError::InvalidRequest(
            "Block request has already been processed".to_string(),
        ));
    }

    let new_status = if approve {
        BlockRequestStatus::Approved
    } else {
        BlockRequestStatus::Rejected
    };

    let request = sqlx::query_as::<_, CardBlockRequest>(
        r#"
        UPDATE card_block_requests
        SET status = $1, processed_at = NOW(), processed_by = $2, admin_comment = $3
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(new_status)
    .bind(admin.id)
    .bind(admin_comment)
    .bind(request_id)
    .fetch_one(&mut *tx)
    .await?;

    // Approval blocks the card; rejection leaves it untouched.
    if approve {
        sqlx::query("UPDATE cards SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(CardStatus::Blocked)
            .bind(request.card_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    tracing::info!(
        request_id = %request.id,
        card_id = %request.card_id,
        approved = approve,
        "block request processed"
    );

    Ok(request)
}

/// Admin action on a card's stored status.
#[derive(Debug, Clone, Copy)]
pub enum StatusAction {
    Block,
    Activate,
}

/// Directly block or activate a card (admin operation).
///
/// These are the unguarded stored-status transitions: activating an expired
/// card succeeds here, and the card still reports inactive through
/// `Card::is_active` because of the date check.
pub async fn set_card_status(
    pool: &DbPool,
    card_id: Uuid,
    action: StatusAction,
) -> Result<Card, AppError> {
    let mut card = sqlx::query_as::<_, Card>("SELECT * FROM cards WHERE id = $1")
        .bind(card_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::CardNotFound)?;

    match action {
        StatusAction::Block => card.block(),
        StatusAction::Activate => card.activate(),
    }

    sqlx::query("UPDATE cards SET status = $1, updated_at = NOW() WHERE id = $2")
        .bind(card.status)
        .bind(card.id)
        .execute(pool)
        .await?;

    Ok(card)
}

/// Random decimal digits for card numbers and CVVs.
fn generate_digits(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_digits_have_requested_length_and_charset() {
        for len in [3, 16] {
            let digits = generate_digits(len);
            assert_eq!(digits.len(), len);
            assert!(digits.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn generated_numbers_mask_cleanly() {
        let number = generate_digits(16);
        let masked = crate::crypto::masking::mask_number(&number);
        assert!(masked.starts_with("**** **** **** "));
        assert!(masked.ends_with(&number[12..]));
    }
}
