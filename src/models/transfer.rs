//! Transfer data model and API request/response types.
//!
//! This module defines:
//! - `Transfer`: Database entity representing a card-to-card transfer
//! - `TransferRequest`: Request body for executing a transfer
//! - `TransferResponse`: Response body with masked card numbers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transfer outcome as stored.
///
/// Write-once: a row is inserted as `COMPLETED` within the same database
/// transaction as the balance updates, or not at all. No PENDING state is
/// ever visible to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transfer_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TransferStatus {
    Completed,
    Failed,
}

/// Represents a transfer record from the database.
///
/// # Database Table
///
/// Maps to the `transfers` table. Each transfer:
/// - References a source and a destination card (never the same one)
/// - Stores amount in cents (never floats!)
/// - Is immutable after insert — an append-only ledger entry
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Transfer {
    /// Unique identifier for this transfer
    pub id: Uuid,

    /// Source card (debited)
    pub from_card_id: Uuid,

    /// Destination card (credited)
    pub to_card_id: Uuid,

    /// Amount in cents
    ///
    /// Must be positive (enforced by CHECK constraint)
    pub amount_cents: i64,

    /// Human-readable description
    pub description: Option<String>,

    /// Transfer status (COMPLETED in every persisted row today)
    pub status: TransferStatus,

    /// Server-assigned creation timestamp, never updated
    pub created_at: DateTime<Utc>,
}

/// Request to transfer money between two of the acting user's cards.
///
/// # JSON Example
///
/// ```json
/// {
///   "from_card_id": "550e8400-e29b-41d4-a716-446655440000",
///   "to_card_id": "660e8400-e29b-41d4-a716-446655440001",
///   "amount_cents": 10000,
///   "description": "Topping up the travel card",
///   "cvv": "123"
/// }
/// ```
///
/// # Validation
///
/// - Both cards must belong to the authenticated user
/// - Both cards must be active (status and expiration date)
/// - Source must have sufficient balance
/// - Cards must be different
/// - `cvv`, if supplied, must match the source card's CVV
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Card to transfer from (will decrease)
    pub from_card_id: Uuid,

    /// Card to transfer to (will increase)
    pub to_card_id: Uuid,

    /// Amount to transfer in cents
    pub amount_cents: i64,

    /// Optional description
    pub description: Option<String>,

    /// Optional confirmation code, checked against the source card's CVV.
    /// Never echoed back in any response or log.
    pub cvv: Option<String>,
}

/// Response returned for transfer operations.
///
/// Card numbers appear masked only; raw numbers, CVVs, and the confirmation
/// code are never included.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "770e8400-e29b-41d4-a716-446655440002",
///   "from_card_id": "550e8400-e29b-41d4-a716-446655440000",
///   "from_card_masked": "**** **** **** 1234",
///   "to_card_id": "660e8400-e29b-41d4-a716-446655440001",
///   "to_card_masked": "**** **** **** 5678",
///   "amount_cents": 10000,
///   "description": "Topping up the travel card",
///   "status": "COMPLETED",
///   "created_at": "2026-08-01T16:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub id: Uuid,
    pub from_card_id: Uuid,
    pub from_card_masked: String,
    pub to_card_id: Uuid,
    pub to_card_masked: String,
    pub amount_cents: i64,
    pub description: Option<String>,
    pub status: TransferStatus,
    pub created_at: DateTime<Utc>,
}

impl TransferResponse {
    /// Assemble the API representation from a transfer row and the masked
    /// numbers of its two cards.
    pub fn new(transfer: Transfer, from_card_masked: String, to_card_masked: String) -> Self {
        Self {
            id: transfer.id,
            from_card_id: transfer.from_card_id,
            from_card_masked,
            to_card_id: transfer.to_card_id,
            to_card_masked,
            amount_cents: transfer.amount_cents,
            description: transfer.description,
            status: transfer.status,
            created_at: transfer.created_at,
        }
    }
}

/// Query parameters for listing transfers.
#[derive(Debug, Deserialize)]
pub struct ListTransfersQuery {
    /// Restrict to transfers touching this card (either side)
    pub card_id: Option<Uuid>,

    /// Page size, capped at 100
    #[serde(default = "default_limit")]
    pub limit: i64,

    /// Page offset
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}
