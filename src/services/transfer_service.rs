//! Transfer service - Core business logic for card-to-card transfers.
//!
//! This service handles:
//! - Pure rule validation (ownership, card activity, balance, CVV)
//! - Atomic balance updates
//! - Recording the transfer ledger entry
//!
//! # Atomicity Guarantees
//!
//! All balance updates happen within PostgreSQL transactions.
//! The database ensures all-or-nothing execution. Both card rows are locked
//! with `FOR UPDATE` in ascending card-id order, so two concurrent transfers
//! touching the same cards are serialized and cannot deadlock each other:
//! of two simultaneous debits that together exceed the balance, exactly one
//! commits and the other fails the balance check.

use sqlx::Postgres;
use uuid::Uuid;

use crate::{
    crypto::{codec::CardCipher, masking},
    db::DbPool,
    error::AppError,
    middleware::auth::AuthUser,
    models::card::Card,
    models::transfer::{
        ListTransfersQuery, Transfer, TransferRequest, TransferResponse, TransferStatus,
    },
};

/// Upper bound for list page sizes.
const MAX_PAGE_SIZE: i64 = 100;

/// Check all transfer rules against two loaded cards.
///
/// Pure: no I/O beyond CVV decryption, no mutation. Checks run in a fixed
/// order and the first violation determines the reported error:
///
/// 1. source and destination must differ
/// 2. both cards must belong to the acting user
/// 3. source card must be active (status and expiration date)
/// 4. destination card must be active
/// 5. amount must be positive (re-checked here even though the request
///    path validates it first)
/// 6. source balance must cover the amount
/// 7. the confirmation code, if supplied, must match the source card's CVV
pub fn validate_transfer(
    cipher: &CardCipher,
    user: &AuthUser,
    from_card: &Card,
    to_card: &Card,
    amount_cents: i64,
    cvv: Option<&str>,
) -> Result<(), AppError> {
    if from_card.id == to_card.id {
        return Err(AppError::InvalidTransfer(
            "Cannot transfer to the same card".to_string(),
        ));
    }

    if !user.owns(from_card) || !user.owns(to_card) {
        return Err(AppError::InvalidTransfer(
            "Card does not belong to the authenticated user".to_string(),
        ));
    }

    if !from_card.is_active() {
        return Err(AppError::InvalidTransfer(
            "Source card is not active".to_string(),
        ));
    }

    if !to_card.is_active() {
        return Err(AppError::InvalidTransfer(
            "Destination card is not active".to_string(),
        ));
    }

    if amount_cents <= 0 {
        return Err(AppError::InvalidRequest(
            "Amount must be positive".to_string(),
        ));
    }

    if from_card.balance_cents < amount_cents {
        return Err(AppError::InsufficientFunds);
    }

    if let Some(code) = cvv {
        if code != cipher.decrypt(&from_card.cvv_encrypted) {
            return Err(AppError::InvalidTransfer(
                "CVV does not match".to_string(),
            ));
        }
    }

    Ok(())
}

/// Execute a transfer between two of the acting user's cards.
///
/// # Process
///
/// 1. Start database transaction
/// 2. Lock and load both cards (`FOR UPDATE`, ascending id order)
/// 3. Run the validator; any violation rolls back with no mutation
/// 4. Debit source, credit destination, persist both balances
/// 5. Record the transfer with status COMPLETED
/// 6. Commit (or rollback on error)
///
/// # Errors
///
/// - `CardNotFound`: Either card doesn't exist
/// - `InvalidTransfer`: Same card, not owner, inactive card, or CVV mismatch
/// - `InsufficientFunds`: Source balance below the amount
/// - `InvalidRequest`: Amount is zero or negative
/// - `Database`: Database error occurred
pub async fn execute_transfer(
    pool: &DbPool,
    cipher: &CardCipher,
    user: &AuthUser,
    request: TransferRequest,
) -> Result<TransferResponse, AppError> {
    // Validate amount before touching the database
    if request.amount_cents <= 0 {
        return Err(AppError::InvalidRequest(
            "Amount must be positive".to_string(),
        ));
    }

    // Start database transaction
    let mut tx = pool.begin().await?;

    // Lock both cards in ascending id order. The stable order prevents
    // deadlock between concurrent opposite-direction transfers.
    let (mut from_card, mut to_card) = if request.from_card_id <= request.to_card_id {
        let from = lock_card(&mut tx, request.from_card_id).await?;
        let to = lock_card(&mut tx, request.to_card_id).await?;
        (from, to)
    } else {
        let to = lock_card(&mut tx, request.to_card_id).await?;
        let from = lock_card(&mut tx, request.from_card_id).await?;
        (from, to)
    };

    // Run the rule checks; a violation leaves the store unchanged
    if let Err(err) = validate_transfer(
        cipher,
        user,
        &from_card,
        &to_card,
        request.amount_cents,
        request.cvv.as_deref(),
    ) {
        tx.rollback().await?;
        return Err(err);
    }

    // Mutate the aggregates, then persist the resulting balances.
    // The debit cannot fail after validation, but its verdict is still
    // honored rather than assumed.
    if !from_card.debit(request.amount_cents) {
        tx.rollback().await?;
        return Err(AppError::InsufficientFunds);
    }
    to_card.credit(request.amount_cents);

    sqlx::query("UPDATE cards SET balance_cents = $1, updated_at = NOW() WHERE id = $2")
        .bind(from_card.balance_cents)
        .bind(from_card.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE cards SET balance_cents = $1, updated_at = NOW() WHERE id = $2")
        .bind(to_card.balance_cents)
        .bind(to_card.id)
        .execute(&mut *tx)
        .await?;

    // Record the transfer
    let transfer = sqlx::query_as::<_, Transfer>(
        r#"
        INSERT INTO transfers (from_card_id, to_card_id, amount_cents, description, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(from_card.id)
    .bind(to_card.id)
    .bind(request.amount_cents)
    .bind(request.description)
    .bind(TransferStatus::Completed)
    .fetch_one(&mut *tx)
    .await?;

    // Commit ALL changes atomically
    // If this fails, everything rolls back
    tx.commit().await?;

    tracing::info!(
        transfer_id = %transfer.id,
        from_card = %from_card.id,
        to_card = %to_card.id,
        amount_cents = transfer.amount_cents,
        "transfer completed"
    );

    Ok(TransferResponse::new(
        transfer,
        masking::masked_card_number(cipher, &from_card),
        masking::masked_card_number(cipher, &to_card),
    ))
}

/// Lock a card row `FOR UPDATE` and load it.
async fn lock_card(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    card_id: Uuid,
) -> Result<Card, AppError> {
    sqlx::query_as::<_, Card>("SELECT * FROM cards WHERE id = $1 FOR UPDATE")
        .bind(card_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(AppError::CardNotFound)
}

/// Transfer row joined with the encrypted numbers of both cards, so a
/// listing needs one query instead of one per card.
#[derive(sqlx::FromRow)]
struct TransferWithNumbers {
    #[sqlx(flatten)]
    transfer: Transfer,
    from_number_encrypted: String,
    to_number_encrypted: String,
}

impl TransferWithNumbers {
    fn into_response(self, cipher: &CardCipher) -> TransferResponse {
        let from_masked = masking::masked_encrypted_number(cipher, &self.from_number_encrypted);
        let to_masked = masking::masked_encrypted_number(cipher, &self.to_number_encrypted);
        TransferResponse::new(self.transfer, from_masked, to_masked)
    }
}

/// Get a transfer by ID, visible only if it touches one of the acting
/// user's cards.
pub async fn get_transfer(
    pool: &DbPool,
    cipher: &CardCipher,
    user: &AuthUser,
    transfer_id: Uuid,
) -> Result<TransferResponse, AppError> {
    let row = sqlx::query_as::<_, TransferWithNumbers>(
        r#"
        SELECT t.*,
               f.number_encrypted AS from_number_encrypted,
               d.number_encrypted AS to_number_encrypted
        FROM transfers t
        JOIN cards f ON f.id = t.from_card_id
        JOIN cards d ON d.id = t.to_card_id
        WHERE t.id = $1 AND (f.user_id = $2 OR d.user_id = $2)
        "#,
    )
    .bind(transfer_id)
    .bind(user.id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::TransferNotFound)?;

    Ok(row.into_response(cipher))
}

/// List the acting user's transfers, newest first, optionally filtered to
/// those touching one card.
pub async fn list_transfers(
    pool: &DbPool,
    cipher: &CardCipher,
    user: &AuthUser,
    query: &ListTransfersQuery,
) -> Result<Vec<TransferResponse>, AppError> {
    let limit = query.limit.clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.max(0);

    let rows = sqlx::query_as::<_, TransferWithNumbers>(
        r#"
        SELECT t.*,
               f.number_encrypted AS from_number_encrypted,
               d.number_encrypted AS to_number_encrypted
        FROM transfers t
        JOIN cards f ON f.id = t.from_card_id
        JOIN cards d ON d.id = t.to_card_id
        WHERE (f.user_id = $1 OR d.user_id = $1)
          AND ($2::uuid IS NULL OR t.from_card_id = $2 OR t.to_card_id = $2)
        ORDER BY t.created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(user.id)
    .bind(query.card_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| row.into_response(cipher))
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::{Days, Utc};

    use super::*;
    use crate::models::card::CardStatus;

    fn cipher() -> CardCipher {
        CardCipher::from_secret(Some("transfer-test-key"))
    }

    fn user() -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: "owner@example.com".to_string(),
            is_admin: false,
        }
    }

    fn card_of(user: &AuthUser, balance_cents: i64, status: CardStatus) -> Card {
        let today = Utc::now().date_naive();
        Card {
            id: Uuid::new_v4(),
            user_id: user.id,
            number_encrypted: String::new(),
            cvv_encrypted: String::new(),
            holder_name: "TEST HOLDER".to_string(),
            expiration_date: today.checked_add_days(Days::new(365)).unwrap(),
            balance_cents,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn same_card_is_rejected_regardless_of_balance() {
        let c = cipher();
        let u = user();
        let card = card_of(&u, 1_000_000, CardStatus::Active);

        let err = validate_transfer(&c, &u, &card, &card, 100, None).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransfer(_)));
    }

    #[test]
    fn foreign_card_is_rejected() {
        let c = cipher();
        let u = user();
        let stranger = user();
        let mine = card_of(&u, 100_000, CardStatus::Active);
        let theirs = card_of(&stranger, 100_000, CardStatus::Active);

        let err = validate_transfer(&c, &u, &mine, &theirs, 100, None).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransfer(_)));

        let err = validate_transfer(&c, &u, &theirs, &mine, 100, None).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransfer(_)));
    }

    #[test]
    fn blocked_source_card_is_rejected() {
        let c = cipher();
        let u = user();
        let from = card_of(&u, 100_000, CardStatus::Blocked);
        let to = card_of(&u, 0, CardStatus::Active);

        let err = validate_transfer(&c, &u, &from, &to, 100, None).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransfer(_)));
    }

    #[test]
    fn expired_destination_card_is_rejected() {
        let c = cipher();
        let u = user();
        let from = card_of(&u, 100_000, CardStatus::Active);
        let mut to = card_of(&u, 0, CardStatus::Active);
        to.expiration_date = Utc::now()
            .date_naive()
            .checked_sub_days(Days::new(1))
            .unwrap();

        let err = validate_transfer(&c, &u, &from, &to, 100, None).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransfer(_)));
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let c = cipher();
        let u = user();
        let from = card_of(&u, 100_000, CardStatus::Active);
        let to = card_of(&u, 0, CardStatus::Active);

        for amount in [0, -100] {
            let err = validate_transfer(&c, &u, &from, &to, amount, None).unwrap_err();
            assert!(matches!(err, AppError::InvalidRequest(_)));
        }
    }

    #[test]
    fn insufficient_balance_is_a_distinct_error() {
        let c = cipher();
        let u = user();
        // 50.00 on the card, 100.00 requested.
        let from = card_of(&u, 5_000, CardStatus::Active);
        let to = card_of(&u, 0, CardStatus::Active);

        let err = validate_transfer(&c, &u, &from, &to, 10_000, None).unwrap_err();
        assert!(matches!(err, AppError::InsufficientFunds));
    }

    #[test]
    fn exact_balance_passes() {
        let c = cipher();
        let u = user();
        let from = card_of(&u, 10_000, CardStatus::Active);
        let to = card_of(&u, 0, CardStatus::Active);

        assert!(validate_transfer(&c, &u, &from, &to, 10_000, None).is_ok());
    }

    #[test]
    fn cvv_is_checked_only_when_supplied() {
        let c = cipher();
        let u = user();
        let mut from = card_of(&u, 100_000, CardStatus::Active);
        from.cvv_encrypted = c.encrypt("123").unwrap();
        let to = card_of(&u, 0, CardStatus::Active);

        assert!(validate_transfer(&c, &u, &from, &to, 100, None).is_ok());
        assert!(validate_transfer(&c, &u, &from, &to, 100, Some("123")).is_ok());

        let err = validate_transfer(&c, &u, &from, &to, 100, Some("999")).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransfer(_)));
    }

    #[test]
    fn first_failing_check_wins() {
        let c = cipher();
        let u = user();
        // Blocked card with insufficient balance and wrong CVV: the
        // activity check (3) fires before balance (6) and CVV (7).
        let from = card_of(&u, 0, CardStatus::Blocked);
        let to = card_of(&u, 0, CardStatus::Active);

        let err = validate_transfer(&c, &u, &from, &to, 10_000, Some("000")).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransfer(_)));
    }

    #[test]
    fn transfer_arithmetic_matches_the_executor_path() {
        let c = cipher();
        let u = user();
        // 1000.00 and 500.00; transfer 100.00.
        let mut from = card_of(&u, 100_000, CardStatus::Active);
        let mut to = card_of(&u, 50_000, CardStatus::Active);

        validate_transfer(&c, &u, &from, &to, 10_000, None).unwrap();
        assert!(from.debit(10_000));
        to.credit(10_000);

        assert_eq!(from.balance_cents, 90_000);
        assert_eq!(to.balance_cents, 60_000);
    }
}
