use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client
/// (anonymous or logged-in). These routes handle read-only item access that is
/// restricted to active-equivalent rows, core gateway functions (registration,
/// login), and the two image read paths.
///
/// Security Mandate:
/// The item listing and detail handlers in this module must only surface
/// claimable (active-equivalent) rows at the Repository level, so anonymous
/// users never see rejected or archived reports.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        .route("/health", get(handlers::health_check))
        // POST /auth/register
        // Account creation via the external auth provider, plus the local
        // profile fallback insert. Never returns a session token.
        .route("/auth/register", post(handlers::register))
        // POST /auth/login
        // Password-grant authentication; returns the bearer token and profile.
        .route("/auth/login", post(handlers::login))
        // GET /items?type=...&category=...&search=...&page=...
        // The unified dual-table listing with per-table filtering and
        // in-memory pagination after the union.
        .route("/items", get(handlers::get_items))
        // GET /items/{id}
        // Single item detail; bumps the view counter best-effort.
        .route("/items/{id}", get(handlers::get_item_details))
        // GET /placeholder/{dims}
        // Neutral placeholder PNG for items without photos (e.g. 400x300).
        .route("/placeholder/{dims}", get(handlers::get_placeholder))
        // GET /uploads/{path}
        // Read-back for images stored through the local filesystem fallback.
        // The handler enforces that the resolved path stays inside the root.
        .route("/uploads/{*path}", get(handlers::serve_upload))
}
