use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to users with the 'ADMIN' account
/// type: moderation, claim resolution, user management, disputes, the flagged
/// queue, analytics, and bulk actions.
///
/// Access Control:
/// This entire router is nested under '/admin' behind the authentication
/// layer; every handler then explicitly calls `require_admin()` on the
/// resolved `AuthUser` before touching the elevated repository handle.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        // Aggregate counters across both item tables, users, and claims.
        .route("/stats", get(handlers::get_admin_stats))
        // GET /admin/items
        // Review listing over every lifecycle status, both tables unified.
        .route("/items", get(handlers::get_admin_items))
        // PUT /admin/items/{id}/status + POST /admin/items/{id}/moderate
        // Status override and the moderation verbs (approve/reject/archive/flag).
        .route("/items/{id}/status", put(handlers::update_item_status))
        .route("/items/{id}/moderate", post(handlers::moderate_item))
        // DELETE /admin/items/{id}
        // Force delete from whichever table owns the id; audited after success.
        .route("/items/{id}", delete(handlers::delete_item_admin))
        // GET /admin/claims + PUT /admin/claims/{id}
        // Claim review queue and resolution (approve/reject + claimant notice).
        .route("/claims", get(handlers::get_admin_claims))
        .route("/claims/{id}", put(handlers::update_claim))
        // GET /admin/users + PUT /admin/users/{id}/role
        .route("/users", get(handlers::get_admin_users))
        .route("/users/{id}/role", put(handlers::update_user_role))
        // GET /admin/disputes + PUT /admin/disputes/{id}
        .route("/disputes", get(handlers::get_admin_disputes))
        .route("/disputes/{id}", put(handlers::update_dispute))
        // GET /admin/flagged + POST /admin/flagged/{id}/action
        .route("/flagged", get(handlers::get_flagged))
        .route("/flagged/{id}/action", post(handlers::flagged_action))
        // GET /admin/analytics
        .route("/analytics", get(handlers::get_analytics))
        // POST /admin/bulk-action
        // Per-id independent processing; partial success is expected output.
        .route("/bulk-action", post(handlers::bulk_action))
}
