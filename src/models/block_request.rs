//! Card block request model and API types.
//!
//! A user asks for one of their cards to be blocked; an admin approves
//! (which blocks the card) or rejects (which changes nothing on the card).
//! Requests are terminal once processed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Block request lifecycle state. PENDING transitions exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "block_request_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum BlockRequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// Represents a card block request record from the database.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct CardBlockRequest {
    /// Unique identifier for this request
    pub id: Uuid,

    /// Card the user wants blocked
    pub card_id: Uuid,

    /// Requesting user
    pub user_id: Uuid,

    /// Free-text reason supplied by the user
    pub reason: String,

    /// Current state of the request
    pub status: BlockRequestStatus,

    /// When the request was created
    pub created_at: DateTime<Utc>,

    /// When an admin processed the request (NULL while pending)
    pub processed_at: Option<DateTime<Utc>>,

    /// Admin who processed the request (NULL while pending)
    pub processed_by: Option<Uuid>,

    /// Optional comment left by the processing admin
    pub admin_comment: Option<String>,
}

/// Request body for submitting a block request.
///
/// # JSON Example
///
/// ```json
/// {
///   "reason": "Card was lost on the train"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateBlockRequest {
    /// Why the card should be blocked
    pub reason: String,
}

/// Request body for an admin processing (approving/rejecting) a request.
#[derive(Debug, Default, Deserialize)]
pub struct ProcessBlockRequest {
    /// Optional note recorded on the request
    #[serde(default)]
    pub admin_comment: Option<String>,
}

/// Query parameters for the admin block-request listing.
#[derive(Debug, Deserialize)]
pub struct ListBlockRequestsQuery {
    /// Filter by request status; omitted means all
    pub status: Option<BlockRequestStatus>,
}
