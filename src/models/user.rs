//! User model for authentication and ownership checks.
//!
//! Users are identified by a bearer token stored in the database as a
//! SHA-256 hash. Token issuance happens out of band; this service only
//! verifies presented tokens and compares ownership.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Represents a user record from the database.
///
/// # Database Table
///
/// Maps to the `users` table with columns:
/// - `id`: Unique identifier (UUID)
/// - `email`: Unique email address
/// - `token_hash`: SHA-256 hash of the user's bearer token
/// - `is_admin`: Whether the user may process block requests and manage cards
/// - `created_at`: When the user was created
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique identifier for this user
    pub id: Uuid,

    /// Email address, used for display and support, never for auth decisions
    pub email: String,

    /// SHA-256 hash of the bearer token (64 hex characters)
    ///
    /// When a request comes in with "Bearer abc123", we:
    /// 1. Hash "abc123" with SHA-256
    /// 2. Look up this hash in the database
    /// 3. If found, authenticate the request as this user
    pub token_hash: String,

    /// Whether this user holds the admin role
    pub is_admin: bool,

    /// Timestamp when this user was created
    pub created_at: DateTime<Utc>,
}
