//! Card Vault - Main Application Entry Point
//!
//! This is a REST API server for managing bank cards: users hold cards with
//! encrypted numbers and CVVs, request blocks, and transfer money between
//! their own cards atomically.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: Bearer token with SHA-256 hashing
//! - **Card data**: AES-256 encrypted at rest, masked on output
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Build the card cipher from the configured key (or an ephemeral one)
//! 3. Create database connection pool
//! 4. Run database migrations
//! 5. Build HTTP router with routes and middleware
//! 6. Start server on configured port

mod config;
mod crypto;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod services;
mod state;

use tracing_subscriber::EnvFilter;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{crypto::codec::CardCipher, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Build the card cipher; warns loudly if running on an ephemeral key
    let cipher = CardCipher::from_secret(config.card_encryption_key.as_deref());

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let state = AppState::new(pool, cipher);

    // Create authenticated routes (API endpoints)
    let authenticated_routes = Router::new()
        // Card management routes
        .route("/api/v1/cards", post(handlers::cards::create_card))
        .route("/api/v1/cards", get(handlers::cards::list_cards))
        .route("/api/v1/cards/{id}", get(handlers::cards::get_card))
        .route(
            "/api/v1/cards/{id}/block-request",
            post(handlers::cards::create_block_request),
        )
        // Transfer routes
        .route(
            "/api/v1/transfers",
            post(handlers::transfers::create_transfer),
        )
        .route("/api/v1/transfers", get(handlers::transfers::list_transfers))
        .route(
            "/api/v1/transfers/{id}",
            get(handlers::transfers::get_transfer),
        )
        // Admin routes (handlers additionally check the admin role)
        .route(
            "/api/v1/admin/block-requests",
            get(handlers::admin::list_block_requests),
        )
        .route(
            "/api/v1/admin/block-requests/{id}/approve",
            post(handlers::admin::approve_block_request),
        )
        .route(
            "/api/v1/admin/block-requests/{id}/reject",
            post(handlers::admin::reject_block_request),
        )
        .route(
            "/api/v1/admin/cards/{id}/block",
            post(handlers::admin::block_card),
        )
        .route(
            "/api/v1/admin/cards/{id}/activate",
            post(handlers::admin::activate_card),
        )
        // Apply authentication middleware to all routes in this group
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    // Combine authenticated routes with public routes
    let app = Router::new()
        // Public routes (no authentication required)
        .route("/health", get(handlers::health::health_check))
        // Merge authenticated routes
        .merge(authenticated_routes)
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        // Share pool and cipher with all handlers via State extraction
        .with_state(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Start serving HTTP requests
    // This blocks forever, handling requests concurrently with tokio
    axum::serve(listener, app).await?;

    Ok(())
}
