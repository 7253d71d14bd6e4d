use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod media;
pub mod memory;
pub mod models;
pub mod moderation;
pub mod repository;
pub mod storage;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser; // The resolved authenticated user identity.
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use config::AppConfig;
pub use identity::{GoTrueClient, IdentityState, MockIdentityService};
pub use memory::MockRepository;
pub use moderation::{AdminRepositoryState, PostgresAdminRepository};
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// This struct auto-generates the OpenAPI documentation (Swagger JSON) for the application.
/// It aggregates all API paths and data schemas that have been decorated with
/// the `#[utoipa::path]` and `#[derive(utoipa::ToSchema)]` macros.
/// The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    // List all public handler functions here for documentation generation.
    paths(
        handlers::health_check, handlers::register, handlers::login, handlers::get_me,
        handlers::get_items, handlers::get_item_details, handlers::create_item,
        handlers::update_item, handlers::upload_image, handlers::serve_upload,
        handlers::get_placeholder, handlers::get_dashboard, handlers::create_claim,
        handlers::get_admin_stats, handlers::get_admin_items, handlers::update_item_status,
        handlers::moderate_item, handlers::delete_item_admin, handlers::get_admin_claims,
        handlers::update_claim, handlers::get_admin_users, handlers::update_user_role,
        handlers::get_admin_disputes, handlers::update_dispute, handlers::get_flagged,
        handlers::flagged_action, handlers::get_analytics, handlers::bulk_action
    ),
    // List all models (schemas) used in the request/response bodies.
    components(
        schemas(
            models::Item, models::ItemType, models::ItemStatus, models::UrgencyLevel,
            models::ContactPreference, models::ClaimStatus, models::ModerationAction,
            models::FlaggedAction, models::Profile, models::UserProfile,
            models::RegisterRequest, models::RegisterResponse, models::LoginRequest,
            models::LoginResponse, models::CreateItemRequest, models::UpdateItemRequest,
            models::ItemListResponse, models::ImageUploadResponse, models::ClaimRequest,
            models::CreateClaimRequest, models::ClaimUpdateRequest, models::DashboardStats,
            models::DashboardData, models::AdminStats, models::AdminItemsResponse,
            models::AdminClaimsResponse, models::AdminUsersResponse, models::SetStatusRequest,
            models::ModerateRequest, models::RoleUpdateRequest, models::Dispute,
            models::DisputesResponse, models::DisputeUpdateRequest, models::FlaggedContent,
            models::FlaggedResponse, models::FlaggedActionRequest, models::BulkActionRequest,
            models::BulkActionResult, models::BulkActionResponse, models::PlatformHealth,
            models::AnalyticsResponse,
        )
    ),
    tags(
        (name = "lost-and-found", description = "Campus Lost & Found Portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Implements the **Unified State Pattern**. This is the single, thread-safe, and immutable
/// container holding all essential application services and configuration.
/// The application state is shared across all incoming requests.
///
/// Note the two distinct persistence handles: `repo` is the standard-capability
/// handle used on behalf of ordinary users, `admin` the elevated handle for
/// moderation and console operations. Keeping them as separate typed fields
/// means a handler's privilege level is visible in what it touches.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer (standard capability): dual-table item unification,
    /// claims, profiles, notifications.
    pub repo: RepositoryState,
    /// Repository Layer (elevated capability): moderation, console listings,
    /// statistics, audit trail.
    pub admin: AdminRepositoryState,
    /// Identity Gateway: the external auth provider client.
    pub identity: IdentityState,
    /// Storage Layer: object storage for item images.
    pub storage: StorageState,
    /// Configuration: The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These implementations allow handlers to selectively pull components from the shared AppState.
// This is critical for dependency injection and adhering to the Clean Architecture boundaries.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AdminRepositoryState {
    fn from_ref(app_state: &AppState) -> AdminRepositoryState {
        app_state.admin.clone()
    }
}

impl FromRef<AppState> for IdentityState {
    fn from_ref(app_state: &AppState) -> IdentityState {
        app_state.identity.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// A middleware function that enforces authentication for the `authenticated_routes`.
///
/// *Mechanism*: It attempts to extract `AuthUser` from the request. Since `AuthUser`
/// implements `FromRequestParts`, if authentication (JWT validation, DB lookup) fails,
/// the extractor immediately rejects the request with a 401 Unauthorized status,
/// preventing execution of the handler. If successful, it allows the request to proceed.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and scoped middleware,
/// and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: No middleware applied.
        .merge(public::public_routes())
        // Authenticated Routes: Protected by the `auth_middleware`.
        // This implements the first layer of Defense-in-Depth for these routes.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Admin Routes: Nested under '/admin' behind the same authentication
        // layer. The 'ADMIN' role check is performed *inside* the handlers
        // after the request passes authentication.
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Apply the Unified State to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (Applied outermost/first)
    // This section implements the Production Observability Stack.
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: Generates a unique UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: Wraps the entire request/response lifecycle in a tracing span.
                // Uses the `trace_span_logger` to include the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: Ensures the generated x-request-id header is
                // returned to the client and injected into subsequent service calls.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer (Applied last, allowing all traffic in/out after processing)
        .layer(cors)
}

/// trace_span_logger
///
/// Helper function used by `TraceLayer` to customize the tracing span creation.
/// It extracts the `x-request-id` header (if present) and includes it in the
/// structured logging metadata alongside the HTTP method and URI.
///
/// *Goal*: Ensure every log line for a single request is correlated by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    // The structured log format used by the tracing macros.
    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
