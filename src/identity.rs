use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

// 1. IdentityService Contract

/// IdentityService
///
/// Defines the abstract contract for the external auth provider: credential
/// creation and password authentication. Token *validation* is not part of this
/// trait; provider-issued JWTs are verified locally against the shared secret
/// (see `auth.rs`), so the hot path never blocks on the provider.
///
/// The trait allows swapping the real GoTrue-style client for the in-memory
/// mock during testing without affecting the calling handlers.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Creates the credential record at the provider. Returns the provider's
    /// canonical user (id + email + confirmation state). Never returns a
    /// session: registration forces an explicit login.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        is_admin: bool,
    ) -> ApiResult<ProviderUser>;

    /// Password-grant authentication. Returns a bearer token and the
    /// provider-side user record.
    async fn sign_in(&self, email: &str, password: &str) -> ApiResult<ProviderSession>;
}

/// IdentityState
///
/// The concrete type used to share the identity gateway across the application state.
pub type IdentityState = Arc<dyn IdentityService>;

// --- Provider Payloads ---

/// ProviderUser
///
/// The slice of the provider's user object this application cares about. The
/// metadata blob carries the registration-time full name and admin flag, which
/// the login path uses to synthesize a missing profile row.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProviderUser {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_metadata: Option<serde_json::Value>,
}

impl ProviderUser {
    pub fn metadata_full_name(&self) -> Option<String> {
        self.user_metadata
            .as_ref()
            .and_then(|m| m.get("full_name"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    pub fn metadata_is_admin(&self) -> bool {
        self.user_metadata
            .as_ref()
            .and_then(|m| m.get("is_admin"))
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// ProviderSession
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProviderSession {
    pub access_token: String,
    pub user: ProviderUser,
}

/// split_full_name
///
/// First whitespace-delimited token becomes the first name, the remainder the
/// last name. Mirrors how the provider trigger splits registration metadata,
/// so a fallback-inserted profile matches a trigger-inserted one.
pub fn split_full_name(full_name: &str) -> (String, String) {
    let mut parts = full_name.split_whitespace();
    let first = parts.next().unwrap_or("User").to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

/// SignUpPayload
///
/// The provider's signup response varies by confirmation settings: a bare user
/// object when email confirmation is pending, a session envelope when the
/// account auto-confirms. This shape tolerates both.
#[derive(Debug, Deserialize, Default)]
struct SignUpPayload {
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    user_metadata: Option<serde_json::Value>,
    #[serde(default)]
    user: Option<ProviderUser>,
}

// 2. The Real Implementation (GoTrue REST gateway)

/// GoTrueClient
///
/// Drives the provider's REST endpoints with `reqwest`. The anon key is sent
/// as the `apikey` header on every call, per the provider's gateway contract.
#[derive(Clone)]
pub struct GoTrueClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl GoTrueClient {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }
}

#[async_trait]
impl IdentityService for GoTrueClient {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        is_admin: bool,
    ) -> ApiResult<ProviderUser> {
        let url = format!("{}/signup", self.base_url);

        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name, "is_admin": is_admin },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            // The provider rejects duplicates, weak passwords, malformed emails.
            return Err(ApiError::Validation(
                "Registration failed. Please check your email and try again.".to_string(),
            ));
        }

        let payload = response.json::<SignUpPayload>().await?;

        // Flatten the two response shapes into one user record.
        if let Some(user) = payload.user {
            return Ok(user);
        }
        let id = payload.id.ok_or_else(|| {
            ApiError::Upstream("signup response carried no user id".to_string())
        })?;
        Ok(ProviderUser {
            id,
            email: payload.email.unwrap_or_else(|| email.to_string()),
            email_confirmed_at: payload.email_confirmed_at,
            user_metadata: payload.user_metadata,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> ApiResult<ProviderSession> {
        let url = format!("{}/token?grant_type=password", self.base_url);

        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Auth(
                "Invalid email or password. Please check your credentials and try again."
                    .to_string(),
            ));
        }

        Ok(response.json::<ProviderSession>().await?)
    }
}

// 3. The Mock Implementation (For Unit Tests)

/// MockIdentityService
///
/// In-memory account store used by handler tests. Mirrors the provider's
/// observable behavior: duplicate signups fail, wrong passwords fail, and
/// successful logins return a deterministic bearer token.
#[derive(Default)]
pub struct MockIdentityService {
    accounts: Mutex<HashMap<String, MockAccount>>,
}

struct MockAccount {
    id: Uuid,
    password: String,
    full_name: String,
    is_admin: bool,
}

impl MockIdentityService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityService for MockIdentityService {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        is_admin: bool,
    ) -> ApiResult<ProviderUser> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(ApiError::Validation(
                "Registration failed. Please check your email and try again.".to_string(),
            ));
        }
        let id = Uuid::new_v4();
        accounts.insert(
            email.to_string(),
            MockAccount {
                id,
                password: password.to_string(),
                full_name: full_name.to_string(),
                is_admin,
            },
        );
        Ok(ProviderUser {
            id,
            email: email.to_string(),
            email_confirmed_at: None,
            user_metadata: Some(
                serde_json::json!({ "full_name": full_name, "is_admin": is_admin }),
            ),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> ApiResult<ProviderSession> {
        let accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get(email)
            .filter(|a| a.password == password)
            .ok_or_else(|| {
                ApiError::Auth(
                    "Invalid email or password. Please check your credentials and try again."
                        .to_string(),
                )
            })?;
        Ok(ProviderSession {
            access_token: format!("mock-token-{}", account.id),
            user: ProviderUser {
                id: account.id,
                email: email.to_string(),
                email_confirmed_at: Some(Utc::now()),
                user_metadata: Some(serde_json::json!({
                    "full_name": account.full_name,
                    "is_admin": account.is_admin,
                })),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_full_name_takes_first_token() {
        assert_eq!(
            split_full_name("Ada Lovelace"),
            ("Ada".to_string(), "Lovelace".to_string())
        );
        assert_eq!(
            split_full_name("Jean Luc Picard"),
            ("Jean".to_string(), "Luc Picard".to_string())
        );
    }

    #[test]
    fn split_full_name_handles_single_and_empty_names() {
        assert_eq!(split_full_name("Plato"), ("Plato".to_string(), String::new()));
        assert_eq!(split_full_name("  "), ("User".to_string(), String::new()));
    }

    #[tokio::test]
    async fn mock_rejects_duplicate_signup() {
        let mock = MockIdentityService::new();
        mock.sign_up("a@umt.edu", "pw", "A B", false).await.unwrap();
        assert!(mock.sign_up("a@umt.edu", "pw2", "A B", false).await.is_err());
    }

    #[tokio::test]
    async fn mock_sign_in_checks_password() {
        let mock = MockIdentityService::new();
        let user = mock.sign_up("b@umt.edu", "secret", "B C", true).await.unwrap();
        assert!(mock.sign_in("b@umt.edu", "wrong").await.is_err());
        let session = mock.sign_in("b@umt.edu", "secret").await.unwrap();
        assert_eq!(session.user.id, user.id);
        assert!(session.user.metadata_is_admin());
    }
}
