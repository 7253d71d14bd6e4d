use crate::{AppState, handlers};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user who has successfully passed the
/// authentication layer. This module implements all core application features
/// for a standard user ('STUDENT' account type): item reporting, owner-only
/// edits, image upload, the personal dashboard, and claim filing.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `AuthUser` extractor middleware
/// being present on the router layer above this module. This guarantees that
/// all handlers receive a validated `AuthUser` struct containing the user's ID
/// and account type, which is then used for all Owner-Only authorization
/// checks (e.g., in `update_item`).
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /auth/me
        // Retrieves the currently authenticated user's profile and session data.
        .route("/auth/me", get(handlers::get_me))
        // POST /items
        // Reports a new lost or found item. The reporter identity is taken
        // from the session, never from the payload.
        .route("/items", post(handlers::create_item))
        // PUT /items/{id}
        // Owner-only partial update. **Strict ownership check** is enforced in
        // the repository with race-safe ordering.
        .route("/items/{id}", put(handlers::update_item))
        // POST /upload
        // Multipart image ingestion: allow-list, size ceiling, normalize,
        // store (object store -> suffixed retry -> local fallback).
        // The body limit sits above the pipeline's 10 MiB ceiling so the
        // handler's own size check produces the 400, with headroom for
        // multipart framing.
        .route(
            "/upload",
            post(handlers::upload_image).layer(DefaultBodyLimit::max(12 * 1024 * 1024)),
        )
        // GET /dashboard
        // Per-user stats, recent items, and claims filed against owned items.
        .route("/dashboard", get(handlers::get_dashboard))
        // POST /claims
        // Files a claim against someone else's active item. The owner
        // notification fires only after the claim row is durably created.
        .route("/claims", post(handlers::create_claim))
}
