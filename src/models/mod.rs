//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables.

/// Card block request workflow model
pub mod block_request;
/// Bank card model and aggregate logic
pub mod card;
/// Card-to-card transfer model
pub mod transfer;
/// User authentication model
pub mod user;
