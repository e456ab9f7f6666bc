//! Shared application state handed to every handler via Axum's `State`.

use std::sync::Arc;

use crate::{crypto::codec::CardCipher, db::DbPool};

/// Cloned per request; both fields are cheap handles.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: DbPool,

    /// Cipher for card numbers and CVVs, built once at startup
    pub cipher: Arc<CardCipher>,
}

impl AppState {
    pub fn new(pool: DbPool, cipher: CardCipher) -> Self {
        Self {
            pool,
            cipher: Arc::new(cipher),
        }
    }
}
