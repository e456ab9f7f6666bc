//! Bearer token authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the bearer token from the Authorization header
//! 2. Hash it and verify it exists in the database
//! 3. Inject the authenticated user into the request
//! 4. Reject unauthorized requests with HTTP 401
//!
//! Token issuance (JWT or otherwise) lives outside this service; from the
//! core's point of view a request arrives with an opaque authenticated
//! identity, and this middleware is the boundary that produces it.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{error::AppError, models::card::Card, models::user::User, state::AppState};

/// Authenticated user attached to every protected request.
///
/// This struct is inserted into the request's extension map and can be
/// extracted by route handlers to know who made the request. It is also the
/// single authorization capability the services consume: ownership via
/// [`AuthUser::owns`], role via [`AuthUser::require_admin`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// ID of the authenticated user, used for ownership comparison
    pub id: Uuid,

    /// Email of the authenticated user
    pub email: String,

    /// Whether the user holds the admin role
    pub is_admin: bool,
}

impl AuthUser {
    /// Whether `card` belongs to this user.
    pub fn owns(&self, card: &Card) -> bool {
        card.user_id == self.id
    }

    /// Gate for admin-only operations.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin { Ok(()) } else { Err(AppError::Forbidden) }
    }
}

/// Bearer token authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <token>` header from request
/// 2. Hash the `<token>` using SHA-256
/// 3. Query database for a user with that token hash
/// 4. If found: inject `AuthUser` into request, call next handler
/// 5. If not found: return 401 Unauthorized error
///
/// # Headers
///
/// Expected header format:
/// ```text
/// Authorization: Bearer abc123xyz
/// ```
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Step 1: Extract Authorization header
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    // Step 2: Extract Bearer token
    // Expected format: "Bearer <token>"
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;

    // Step 3: Hash the token using SHA-256
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());

    let token_hash = hex::encode(hasher.finalize());

    // Step 4: Lookup hashed token in database
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, token_hash, is_admin, created_at
         FROM users
         WHERE token_hash = $1",
    )
    .bind(&token_hash)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::Unauthorized)?;

    // Step 5: Inject the authenticated user into request extensions
    // Route handlers can now extract this using Extension<AuthUser>
    request.extensions_mut().insert(AuthUser {
        id: user.id,
        email: user.email,
        is_admin: user.is_admin,
    });

    // Step 6: Call the next middleware/handler
    Ok(next.run(request).await)
}
