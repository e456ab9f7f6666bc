//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Delegates to a service for business logic
//! 3. Returns HTTP response (JSON, status code)

/// Admin endpoints: block-request processing, direct card status changes
pub mod admin;
/// Card management endpoints
pub mod cards;
/// Health check endpoint
pub mod health;
/// Transfer endpoints
pub mod transfers;
