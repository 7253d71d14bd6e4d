use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// ApiError
///
/// The application-wide error taxonomy. Every failure that crosses a handler
/// boundary is translated into one of these variants close to the point of
/// detection, so the HTTP mapping lives in exactly one place.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad input shape or domain (400).
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid credentials (401).
    #[error("{0}")]
    Auth(String),

    /// Authenticated but not authorized (403).
    #[error("{0}")]
    Forbidden(String),

    /// The referenced id does not resolve (404).
    #[error("{0}")]
    NotFound(String),

    /// Valid request against invalid current state, e.g. claiming a
    /// non-active item or one's own item (400).
    #[error("{0}")]
    Conflict(String),

    /// External storage/auth/object-store failure (500). The wrapped detail
    /// is logged but never leaked to the client.
    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Upstream(msg) => {
                // Log the internal detail, surface a generic message.
                tracing::error!("upstream error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Upstream(format!("database: {}", e))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Upstream(format!("auth provider: {}", e))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// SideEffect
///
/// Outcome of a fire-and-forget operation (notifications, audit rows, view
/// counters). A `Dropped` outcome has already been logged by the producer;
/// callers may inspect it for observability but must never fail the primary
/// operation because of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "side-effect outcomes should at least be inspected or discarded explicitly"]
pub enum SideEffect {
    Recorded,
    Dropped,
}

impl SideEffect {
    pub fn recorded(self) -> bool {
        self == SideEffect::Recorded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_status(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn validation_returns_400() {
        assert_eq!(
            response_status(ApiError::Validation("bad".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn auth_returns_401() {
        assert_eq!(
            response_status(ApiError::Auth("nope".into())),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn forbidden_returns_403() {
        assert_eq!(
            response_status(ApiError::Forbidden("admins only".into())),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn not_found_returns_404() {
        assert_eq!(
            response_status(ApiError::NotFound("gone".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn conflict_returns_400() {
        assert_eq!(
            response_status(ApiError::Conflict("own item".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn side_effect_outcome_is_inspectable() {
        assert!(SideEffect::Recorded.recorded());
        assert!(!SideEffect::Dropped.recorded());
    }

    #[test]
    fn upstream_hides_detail() {
        let response = ApiError::Upstream("pg connection refused at 10.0.0.3".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
