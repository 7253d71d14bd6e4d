use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    models::USER_TYPE_ADMIN,
    repository::RepositoryState,
};

/// Claims
///
/// The payload structure expected inside a provider-issued JSON Web Token.
/// These claims are signed with the provider's shared secret and validated on
/// every authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's UUID, shared with public.profiles.id.
    pub sub: Uuid,
    /// The account email as known to the auth provider. The provider is the
    /// source of truth for this value; it is never persisted locally.
    pub email: Option<String>,
    /// Expiration Time (exp): timestamp after which the JWT must not be accepted.
    pub exp: usize,
    /// Issued At (iat): timestamp when the JWT was issued.
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request: token subject plus the
/// current profile state from the database. Handlers use this struct for every
/// ownership and role check.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The unique identifier of the user, mapped to auth.users.id and public.profiles.id.
    pub id: Uuid,
    /// Email as carried on the token (or synthesized under the dev bypass).
    pub email: String,
    /// The RBAC field: 'STUDENT' or 'ADMIN'.
    pub user_type: String,
    pub first_name: String,
    pub last_name: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.user_type == USER_TYPE_ADMIN
    }

    /// Gate for admin-only operations. Authentication has already happened by
    /// the time this runs; failure here is strictly an authorization problem.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin access required".to_string()))
        }
    }

    pub fn full_name(&self) -> String {
        crate::models::full_name(Some(&self.first_name), Some(&self.last_name))
    }
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a function
/// argument in any authenticated handler. This cleanly separates authentication
/// (extractor) from business logic (the handler).
///
/// The process:
/// 1. Dependency Resolution: Repository and AppConfig pulled from the app state.
/// 2. Local Bypass: development-time access via the 'x-user-id' header, DB-verified.
/// 3. Token Validation: Bearer token extraction and JWT decoding.
/// 4. DB Lookup: the user's current role and existence fetched from Postgres.
///
/// Rejection: `ApiError::Auth` (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    // S must allow sending across threads and sharing.
    S: Send + Sync,
    // Allows the extractor to pull the Repository State from the app state.
    RepositoryState: FromRef<S>,
    // Allows the extractor to pull the AppConfig (for JWT secret and Env check).
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // 1. Dependency Resolution
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // 2. Local Development Bypass Check
        // In Env::Local, a known profile UUID in the 'x-user-id' header authenticates
        // the request. The UUID is still verified against the profiles table so that
        // roles are correctly loaded.
        if config.env == Env::Local {
            if let Some(user_id_header) = parts.headers.get("x-user-id") {
                if let Ok(id_str) = user_id_header.to_str() {
                    if let Ok(user_id) = Uuid::parse_str(id_str) {
                        if let Some(profile) = repo.get_profile(user_id).await {
                            // No token means no provider email; synthesize a stable
                            // address from the id and the institutional domain.
                            let email = format!(
                                "user_{}{}",
                                user_id
                                    .simple()
                                    .to_string()
                                    .chars()
                                    .take(8)
                                    .collect::<String>(),
                                config.email_domain
                            );
                            return Ok(AuthUser {
                                id: profile.id,
                                email,
                                user_type: profile.user_type,
                                first_name: profile.first_name,
                                last_name: profile.last_name,
                            });
                        }
                    }
                }
            }
        }
        // If Env is Production, or if the bypass failed, execution falls through to
        // the standard JWT validation flow.

        // 3. Token Extraction
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Auth("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Auth("Invalid authorization header".to_string()))?;

        // 4. JWT Decoding Setup
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        // Ensure expiration time validation is always active.
        validation.validate_exp = true;
        // Provider tokens carry an audience claim we do not pin.
        validation.validate_aud = false;

        // 5. Decode and Validate the Token
        let token_data = match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(data) => data,
            Err(e) => {
                return Err(match e.kind() {
                    // Token expired: the most common failure for a valid-but-old token.
                    ErrorKind::ExpiredSignature => {
                        ApiError::Auth("Token expired".to_string())
                    }
                    // Bad signature, malformed token, etc.
                    _ => ApiError::Auth("Could not validate credentials".to_string()),
                });
            }
        };

        let user_id = token_data.claims.sub;

        // 6. Database Lookup (Final Verification)
        // Check the database for the user's existence and current role. This prevents
        // access if the user was deleted after the token was issued.
        let profile = repo
            .get_profile(user_id)
            .await
            .ok_or_else(|| ApiError::Auth("User profile not found".to_string()))?;

        Ok(AuthUser {
            id: profile.id,
            email: token_data
                .claims
                .email
                .unwrap_or_else(|| "Unknown".to_string()),
            user_type: profile.user_type,
            first_name: profile.first_name,
            last_name: profile.last_name,
        })
    }
}

/// MaybeAuthUser
///
/// Optional variant of the [`AuthUser`] extractor for public-or-personalized
/// endpoints: an invalid or absent credential yields `None` instead of a 401.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(
            AuthUser::from_request_parts(parts, state).await.ok(),
        ))
    }
}
