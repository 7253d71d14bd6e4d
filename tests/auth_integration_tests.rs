use axum::{Json, Router, routing::get};
use chrono::Utc;
use lostfound_portal::{
    AppConfig, AppState, MockIdentityService, MockRepository, MockStorageService, create_router,
    auth::MaybeAuthUser,
    identity::IdentityState,
    models::Profile,
    moderation::AdminRepositoryState,
    repository::{Repository, RepositoryState},
    storage::StorageState,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

struct TestApp {
    address: String,
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(MockRepository::new());
    let state = AppState {
        repo: repo.clone() as RepositoryState,
        admin: repo as AdminRepositoryState,
        identity: Arc::new(MockIdentityService::new()) as IdentityState,
        storage: Arc::new(MockStorageService::new()) as StorageState,
        config: AppConfig::default(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    TestApp {
        address: format!("http://127.0.0.1:{}", port),
    }
}

#[tokio::test]
async fn register_rejects_non_institutional_email() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/auth/register", app.address))
        .json(&serde_json::json!({
            "email": "someone@gmail.com",
            "password": "hunter22",
            "full_name": "Some One"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn register_succeeds_without_issuing_a_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .post(format!("{}/auth/register", app.address))
        .json(&serde_json::json!({
            "email": "lena@umt.edu",
            "password": "correct-horse",
            "full_name": "Lena Marlin"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["email"], "lena@umt.edu");
    // Registration forces an explicit login.
    assert!(body.get("access_token").is_none());
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let payload = serde_json::json!({
        "email": "dup@umt.edu",
        "password": "pw123456",
        "full_name": "Dup User"
    });
    let first = client
        .post(format!("{}/auth/register", app.address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 200);

    let second = client
        .post(format!("{}/auth/register", app.address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 400);
}

#[tokio::test]
async fn login_returns_token_and_profile() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/auth/register", app.address))
        .json(&serde_json::json!({
            "email": "omar@umt.edu",
            "password": "secret-pass",
            "full_name": "Omar Reyes"
        }))
        .send()
        .await
        .unwrap();

    let body: serde_json::Value = client
        .post(format!("{}/auth/login", app.address))
        .json(&serde_json::json!({
            "email": "omar@umt.edu",
            "password": "secret-pass"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(!body["access_token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["first_name"], "Omar");
    assert_eq!(body["user"]["last_name"], "Reyes");
    assert_eq!(body["user"]["is_admin"], false);
    assert_eq!(body["user"]["email"], "omar@umt.edu");
}

#[tokio::test]
async fn login_with_bad_credentials_is_unauthorized() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/auth/register", app.address))
        .json(&serde_json::json!({
            "email": "vera@umt.edu",
            "password": "right-password",
            "full_name": "Vera Lang"
        }))
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("{}/auth/login", app.address))
        .json(&serde_json::json!({
            "email": "vera@umt.edu",
            "password": "wrong-password"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn admin_registration_carries_through_to_login() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/auth/register", app.address))
        .json(&serde_json::json!({
            "email": "boss@umt.edu",
            "password": "boss-password",
            "full_name": "Big Boss",
            "is_admin": true
        }))
        .send()
        .await
        .unwrap();

    let body: serde_json::Value = client
        .post(format!("{}/auth/login", app.address))
        .json(&serde_json::json!({
            "email": "boss@umt.edu",
            "password": "boss-password"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["user"]["is_admin"], true);
    assert_eq!(body["user"]["user_type"], "ADMIN");
}

/// Handler shaped like a public-or-personalized endpoint: the optional
/// extractor yields None for anonymous or bad credentials instead of a 401.
async fn whoami(user: MaybeAuthUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "user_id": user.0.map(|u| u.id) }))
}

#[tokio::test]
async fn optional_auth_yields_none_instead_of_rejecting() {
    let repo = Arc::new(MockRepository::new());
    let user_id = Uuid::new_v4();
    repo.create_profile(Profile {
        id: user_id,
        first_name: "Maya".to_string(),
        last_name: "Quinn".to_string(),
        user_type: "STUDENT".to_string(),
        account_status: "ACTIVE".to_string(),
        email_verified: true,
        created_at: Utc::now(),
    })
    .await
    .expect("seed profile");

    let state = AppState {
        repo: repo.clone() as RepositoryState,
        admin: repo as AdminRepositoryState,
        identity: Arc::new(MockIdentityService::new()) as IdentityState,
        storage: Arc::new(MockStorageService::new()) as StorageState,
        config: AppConfig::default(),
    };
    let router = Router::new().route("/whoami", get(whoami)).with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    let address = format!("http://127.0.0.1:{}", port);
    let client = reqwest::Client::new();

    // Anonymous: still 200, just no identity.
    let body: serde_json::Value = client
        .get(format!("{}/whoami", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["user_id"].is_null());

    // Garbage credentials degrade to anonymous rather than rejecting.
    let body: serde_json::Value = client
        .get(format!("{}/whoami", address))
        .header("Authorization", "Bearer not-a-jwt")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["user_id"].is_null());

    // A valid identity resolves as usual.
    let body: serde_json::Value = client
        .get(format!("{}/whoami", address))
        .header("x-user-id", user_id.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["user_id"], user_id.to_string());
}

#[tokio::test]
async fn me_requires_authentication() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/auth/me", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let garbage = client
        .get(format!("{}/auth/me", app.address))
        .header("Authorization", "Bearer not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(garbage.status(), 401);
}
