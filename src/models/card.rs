//! Card data model, aggregate logic, and API request/response types.
//!
//! This module defines:
//! - `Card`: Database entity representing a bank card
//! - `CardStatus`: tri-state stored status
//! - Balance and state invariants as plain methods on `Card`, kept free of
//!   any persistence concern — callers persist the mutated values
//! - `CreateCardRequest` / `CardResponse` API types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::{codec::CardCipher, masking};

/// Stored card status.
///
/// `EXPIRED` exists as a stored state but effective activity is the computed
/// predicate [`Card::is_active`], which also checks the expiration date. A
/// card whose date has passed reports inactive even while the stored status
/// still says `ACTIVE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "card_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum CardStatus {
    Active,
    Blocked,
    Expired,
}

/// Represents a card record from the database.
///
/// # Database Table
///
/// Maps to the `cards` table. Each card:
/// - Belongs to exactly one user (cascade-deleted with the user)
/// - Stores number and CVV encrypted (AES-256, base64) — the plaintext
///   never appears in this struct
/// - Stores balance in cents (never floats!)
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Card {
    /// Unique identifier for this card
    pub id: Uuid,

    /// Foreign key to the owning user
    pub user_id: Uuid,

    /// Encrypted card number (or legacy plaintext from before encryption)
    pub number_encrypted: String,

    /// Encrypted CVV, used only for transfer confirmation
    pub cvv_encrypted: String,

    /// Card holder name as printed on the card
    pub holder_name: String,

    /// Expiration date; the card is unusable strictly after this date
    pub expiration_date: NaiveDate,

    /// Current balance in cents (not dollars)
    ///
    /// Must be >= 0 (enforced by database CHECK constraint and by `debit`).
    pub balance_cents: i64,

    /// Stored status (see `CardStatus` for how EXPIRED actually works)
    pub status: CardStatus,

    /// Timestamp when card was created
    pub created_at: DateTime<Utc>,

    /// Timestamp of last balance or status update
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// Whether the card can take part in transfers.
    ///
    /// True iff the stored status is `ACTIVE` and the expiration date is
    /// strictly after today. The date check makes expiry effective without
    /// a stored status transition.
    pub fn is_active(&self) -> bool {
        self.status == CardStatus::Active && Utc::now().date_naive() < self.expiration_date
    }

    /// Whether a debit of `amount_cents` would succeed.
    ///
    /// Callers pass non-negative amounts; negative amounts trivially pass
    /// the balance check and are rejected upstream.
    pub fn can_debit(&self, amount_cents: i64) -> bool {
        self.is_active() && self.balance_cents >= amount_cents
    }

    /// Subtract `amount_cents` if permitted; returns whether it happened.
    ///
    /// On failure the balance is untouched. Not synchronized by itself —
    /// the transfer service serializes concurrent access with row locks
    /// before calling this.
    pub fn debit(&mut self, amount_cents: i64) -> bool {
        if !self.can_debit(amount_cents) {
            return false;
        }
        self.balance_cents -= amount_cents;
        true
    }

    /// Add `amount_cents` to the balance.
    ///
    /// Non-positive amounts are a silent no-op, not an error.
    pub fn credit(&mut self, amount_cents: i64) {
        if amount_cents > 0 {
            self.balance_cents += amount_cents;
        }
    }

    /// Set the stored status to `BLOCKED`. No guard conditions.
    pub fn block(&mut self) {
        self.status = CardStatus::Blocked;
    }

    /// Set the stored status to `ACTIVE`. No guard conditions: an expired
    /// card can be "activated" here and still report `is_active() == false`
    /// because of the date check.
    pub fn activate(&mut self) {
        self.status = CardStatus::Active;
    }

    /// Build the API representation, masking the number via the cipher.
    pub fn to_response(&self, cipher: &CardCipher) -> CardResponse {
        CardResponse {
            id: self.id,
            masked_number: masking::masked_card_number(cipher, self),
            holder_name: self.holder_name.clone(),
            expiration: masking::masked_expiration(self),
            balance_cents: self.balance_cents,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// Request body for creating a new card.
///
/// # JSON Example
///
/// ```json
/// {
///   "holder_name": "JANE DOE",
///   "expiration_date": "2030-06-30",
///   "initial_balance_cents": 100000
/// }
/// ```
///
/// The card number and CVV are generated server-side, never supplied by the
/// client.
#[derive(Debug, Deserialize)]
pub struct CreateCardRequest {
    /// Holder name to print on the card
    pub holder_name: String,

    /// Expiration date (ISO 8601 date)
    pub expiration_date: NaiveDate,

    /// Initial balance in cents (defaults to 0 if not provided)
    #[serde(default)]
    pub initial_balance_cents: i64,
}

/// Response body for card endpoints.
///
/// Contains only the masked number — the full number and the CVV are never
/// returned by any endpoint.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "550e8400-e29b-41d4-a716-446655440000",
///   "masked_number": "**** **** **** 1234",
///   "holder_name": "JANE DOE",
///   "expiration": "06/30",
///   "balance_cents": 100000,
///   "status": "ACTIVE",
///   "created_at": "2026-08-01T10:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct CardResponse {
    pub id: Uuid,
    pub masked_number: String,
    pub holder_name: String,
    pub expiration: String,
    pub balance_cents: i64,
    pub status: CardStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use chrono::Days;

    use super::*;

    fn test_card(balance_cents: i64, status: CardStatus) -> Card {
        let today = Utc::now().date_naive();
        Card {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
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
    fn debit_succeeds_within_balance() {
        let mut card = test_card(100_000, CardStatus::Active);
        assert!(card.debit(10_000));
        assert_eq!(card.balance_cents, 90_000);
    }

    #[test]
    fn debit_of_exact_balance_leaves_zero() {
        let mut card = test_card(10_000, CardStatus::Active);
        assert!(card.debit(10_000));
        assert_eq!(card.balance_cents, 0);
    }

    #[test]
    fn debit_beyond_balance_fails_without_mutation() {
        let mut card = test_card(5_000, CardStatus::Active);
        assert!(!card.debit(10_000));
        assert_eq!(card.balance_cents, 5_000);
    }

    #[test]
    fn credit_then_debit_round_trips() {
        let mut card = test_card(50_000, CardStatus::Active);
        card.credit(7_500);
        assert!(card.debit(7_500));
        assert_eq!(card.balance_cents, 50_000);
    }

    #[test]
    fn credit_ignores_non_positive_amounts() {
        let mut card = test_card(50_000, CardStatus::Active);
        card.credit(0);
        card.credit(-100);
        assert_eq!(card.balance_cents, 50_000);
    }

    #[test]
    fn blocked_card_cannot_debit() {
        let mut card = test_card(100_000, CardStatus::Blocked);
        assert!(!card.is_active());
        assert!(!card.debit(1_000));
        assert_eq!(card.balance_cents, 100_000);
    }

    #[test]
    fn expired_date_makes_card_inactive_even_when_status_is_active() {
        let mut card = test_card(100_000, CardStatus::Active);
        card.expiration_date = Utc::now()
            .date_naive()
            .checked_sub_days(Days::new(1))
            .unwrap();
        assert!(!card.is_active());
        assert!(!card.debit(1_000));

        // Expiring today also counts as inactive (comparison is strict).
        card.expiration_date = Utc::now().date_naive();
        assert!(!card.is_active());
    }

    #[test]
    fn activate_flips_stored_status_but_not_the_date_check() {
        let mut card = test_card(0, CardStatus::Blocked);
        card.activate();
        assert_eq!(card.status, CardStatus::Active);
        assert!(card.is_active());

        // An expired card "activates" at the stored level only.
        card.expiration_date = Utc::now()
            .date_naive()
            .checked_sub_days(Days::new(30))
            .unwrap();
        card.block();
        card.activate();
        assert_eq!(card.status, CardStatus::Active);
        assert!(!card.is_active());
    }
}
