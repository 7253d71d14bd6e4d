use chrono::Utc;
use lostfound_portal::{
    AppConfig, AppState, MockIdentityService, MockRepository, MockStorageService, create_router,
    identity::IdentityState,
    models::{Item, ItemListResponse, Profile},
    moderation::AdminRepositoryState,
    repository::{Repository, RepositoryState},
    storage::StorageState,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub repo: Arc<MockRepository>,
}

/// Boots the full router on an ephemeral port with the in-memory repository
/// and mock identity/storage services. Authentication in tests goes through
/// the Env::Local 'x-user-id' bypass, which still verifies the profile row.
async fn spawn_app() -> TestApp {
    let repo = Arc::new(MockRepository::new());

    let state = AppState {
        repo: repo.clone() as RepositoryState,
        admin: repo.clone() as AdminRepositoryState,
        identity: Arc::new(MockIdentityService::new()) as IdentityState,
        storage: Arc::new(MockStorageService::new()) as StorageState,
        config: AppConfig::default(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, repo }
}

async fn seed_user(app: &TestApp, first: &str, user_type: &str) -> Uuid {
    let id = Uuid::new_v4();
    app.repo
        .create_profile(Profile {
            id,
            first_name: first.to_string(),
            last_name: "Tester".to_string(),
            user_type: user_type.to_string(),
            account_status: "ACTIVE".to_string(),
            email_verified: true,
            created_at: Utc::now(),
        })
        .await
        .expect("seed profile");
    id
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_item_lifecycle_with_unseen_category() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let user_id = seed_user(&app, "Lena", "STUDENT").await;

    // Create a lost item with a category nobody has used yet.
    let response = client
        .post(format!("{}/items", app.address))
        .header("x-user-id", user_id.to_string())
        .json(&serde_json::json!({
            "type": "lost",
            "title": "Blue backpack",
            "description": "Left it in the library",
            "category": "electronics",
            "location": "Main Library",
            "urgency": "high",
            "reward": 25.0
        }))
        .send()
        .await
        .expect("post fail");
    assert_eq!(response.status(), 200);
    let item: Item = response.json().await.unwrap();

    // The lookup row was auto-created and the category reads back normalized.
    assert_eq!(item.category, "electronics");
    assert!(app.repo.category_names().contains(&"Electronics".to_string()));

    // The created item is retrievable immediately and carries the right type.
    let detail = client
        .get(format!("{}/items/{}", app.address, item.id))
        .send()
        .await
        .unwrap();
    assert_eq!(detail.status(), 200);
    let fetched: Item = detail.json().await.unwrap();
    assert_eq!(fetched.id, item.id);
    assert_eq!(fetched.user_id, user_id);
    assert_eq!(fetched.reward, 25.0);

    // And shows up in the public listing.
    let list: ItemListResponse = client
        .get(format!("{}/items", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.total, 1);
    assert_eq!(list.items[0].id, item.id);
}

#[tokio::test]
async fn test_created_type_matches_request() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let user_id = seed_user(&app, "Noor", "STUDENT").await;

    for ty in ["lost", "found"] {
        let item: Item = client
            .post(format!("{}/items", app.address))
            .header("x-user-id", user_id.to_string())
            .json(&serde_json::json!({
                "type": ty,
                "title": format!("{} umbrella", ty),
                "description": "Black, slightly bent",
                "category": "accessories",
                "location": "Cafeteria"
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(item.item_type.as_str(), ty);
    }
}

#[tokio::test]
async fn test_list_spans_both_tables() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let user_id = seed_user(&app, "Omar", "STUDENT").await;

    for (ty, title) in [("lost", "Phone"), ("found", "Wallet")] {
        client
            .post(format!("{}/items", app.address))
            .header("x-user-id", user_id.to_string())
            .json(&serde_json::json!({
                "type": ty,
                "title": title,
                "description": "desc",
                "category": "other",
                "location": "Gym"
            }))
            .send()
            .await
            .unwrap();
    }

    let list: ItemListResponse = client
        .get(format!("{}/items", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.total, 2);
    let types: Vec<&str> = list.items.iter().map(|i| i.item_type.as_str()).collect();
    assert!(types.contains(&"lost"));
    assert!(types.contains(&"found"));

    // Restricting to one side skips the other table entirely.
    let lost_only: ItemListResponse = client
        .get(format!("{}/items?type=lost", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(lost_only.total, 1);
    assert_eq!(lost_only.items[0].item_type.as_str(), "lost");

    // A reward filter can never match the found side.
    let rewarded: ItemListResponse = client
        .get(format!("{}/items?has_reward=true", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(rewarded.total, 0);
}

#[tokio::test]
async fn test_pagination_windows_are_consistent() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let user_id = seed_user(&app, "Page", "STUDENT").await;

    for n in 0..5 {
        client
            .post(format!("{}/items", app.address))
            .header("x-user-id", user_id.to_string())
            .json(&serde_json::json!({
                "type": "lost",
                "title": format!("Item {}", n),
                "description": "desc",
                "category": "other",
                "location": "Hall"
            }))
            .send()
            .await
            .unwrap();
    }

    let mut seen = Vec::new();
    for page in 1..=3 {
        let list: ItemListResponse = client
            .get(format!(
                "{}/items?page={}&per_page=2",
                app.address, page
            ))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(list.total, 5);
        assert_eq!(list.has_prev, page > 1);
        assert_eq!(list.has_next, page < 3);
        assert_eq!(list.items.len(), if page < 3 { 2 } else { 1 });
        for item in &list.items {
            assert!(!seen.contains(&item.id), "pages must not overlap");
            seen.push(item.id);
        }
    }
    assert_eq!(seen.len(), 5);
}

#[tokio::test]
async fn test_claim_rules() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let owner = seed_user(&app, "Olga", "STUDENT").await;
    let claimer = seed_user(&app, "Carl", "STUDENT").await;

    let item: Item = client
        .post(format!("{}/items", app.address))
        .header("x-user-id", owner.to_string())
        .json(&serde_json::json!({
            "type": "found",
            "title": "Silver ring",
            "description": "Found near the fountain",
            "category": "jewelry",
            "location": "Fountain"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // A claim on one's own item always fails.
    let own = client
        .post(format!("{}/claims", app.address))
        .header("x-user-id", owner.to_string())
        .json(&serde_json::json!({ "item_id": item.id, "message": "mine" }))
        .send()
        .await
        .unwrap();
    assert_eq!(own.status(), 400);

    // A claim from someone else succeeds and notifies the owner exactly once.
    let ok = client
        .post(format!("{}/claims", app.address))
        .header("x-user-id", claimer.to_string())
        .json(&serde_json::json!({ "item_id": item.id, "message": "that's mine" }))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), 200);

    let notifications = app.repo.notifications();
    let owner_notices: Vec<_> = notifications
        .iter()
        .filter(|n| n.user_id == owner && n.notification_type == "item_claimed")
        .collect();
    assert_eq!(owner_notices.len(), 1);

    // Archive the item (owner patch), then further claims are conflicts.
    let archived = client
        .put(format!("{}/items/{}", app.address, item.id))
        .header("x-user-id", owner.to_string())
        .json(&serde_json::json!({ "status": "archived" }))
        .send()
        .await
        .unwrap();
    assert_eq!(archived.status(), 200);

    let late = client
        .post(format!("{}/claims", app.address))
        .header("x-user-id", claimer.to_string())
        .json(&serde_json::json!({ "item_id": item.id, "message": "too late" }))
        .send()
        .await
        .unwrap();
    assert_eq!(late.status(), 400);

    // Claims on unknown items are 404s.
    let missing = client
        .post(format!("{}/claims", app.address))
        .header("x-user-id", claimer.to_string())
        .json(&serde_json::json!({ "item_id": Uuid::new_v4(), "message": "?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn test_update_by_non_owner_is_forbidden_and_leaves_item_unmodified() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let owner = seed_user(&app, "Odin", "STUDENT").await;
    let stranger = seed_user(&app, "Sif", "STUDENT").await;

    let item: Item = client
        .post(format!("{}/items", app.address))
        .header("x-user-id", owner.to_string())
        .json(&serde_json::json!({
            "type": "lost",
            "title": "Gray hoodie",
            "description": "Zip-up",
            "category": "clothing",
            "location": "Lecture Hall B"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let response = client
        .put(format!("{}/items/{}", app.address, item.id))
        .header("x-user-id", stranger.to_string())
        .json(&serde_json::json!({ "title": "Stolen title" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let fetched: Item = client
        .get(format!("{}/items/{}", app.address, item.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched.title, "Gray hoodie");
}

#[tokio::test]
async fn test_partial_update_only_touches_present_fields() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let owner = seed_user(&app, "Pia", "STUDENT").await;

    let item: Item = client
        .post(format!("{}/items", app.address))
        .header("x-user-id", owner.to_string())
        .json(&serde_json::json!({
            "type": "lost",
            "title": "Calculator",
            "description": "TI-84",
            "category": "electronics",
            "location": "Math Building",
            "reward": 10.0
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let updated: Item = client
        .put(format!("{}/items/{}", app.address, item.id))
        .header("x-user-id", owner.to_string())
        .json(&serde_json::json!({ "title": "Graphing calculator" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(updated.title, "Graphing calculator");
    // Absent keys are indistinguishable from "no change".
    assert_eq!(updated.description, "TI-84");
    assert_eq!(updated.reward, 10.0);
}

#[tokio::test]
async fn test_protected_routes_require_authentication() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/items", app.address))
        .json(&serde_json::json!({
            "type": "lost",
            "title": "X",
            "description": "Y",
            "category": "other",
            "location": "Z"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let dashboard = client
        .get(format!("{}/dashboard", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(dashboard.status(), 401);
}

#[tokio::test]
async fn test_missing_required_fields_are_rejected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let user_id = seed_user(&app, "Vik", "STUDENT").await;

    let response = client
        .post(format!("{}/items", app.address))
        .header("x-user-id", user_id.to_string())
        .json(&serde_json::json!({
            "type": "lost",
            "title": "   ",
            "description": "present",
            "category": "other",
            "location": "Somewhere"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_dashboard_reports_user_stats() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let user_id = seed_user(&app, "Dara", "STUDENT").await;

    // One lost (later resolved) and one found item.
    let lost: Item = client
        .post(format!("{}/items", app.address))
        .header("x-user-id", user_id.to_string())
        .json(&serde_json::json!({
            "type": "lost", "title": "Keys", "description": "Dorm keys",
            "category": "keys", "location": "Dorm 3"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    client
        .post(format!("{}/items", app.address))
        .header("x-user-id", user_id.to_string())
        .json(&serde_json::json!({
            "type": "found", "title": "Scarf", "description": "Red wool",
            "category": "clothing", "location": "Bus stop"
        }))
        .send()
        .await
        .unwrap();
    client
        .put(format!("{}/items/{}", app.address, lost.id))
        .header("x-user-id", user_id.to_string())
        .json(&serde_json::json!({ "status": "resolved" }))
        .send()
        .await
        .unwrap();

    let dashboard: serde_json::Value = client
        .get(format!("{}/dashboard", app.address))
        .header("x-user-id", user_id.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(dashboard["stats"]["total_items_posted"], 2);
    assert_eq!(dashboard["stats"]["items_recovered"], 1);
    assert_eq!(dashboard["stats"]["helping_others"], 1);
    assert_eq!(dashboard["stats"]["success_rate"], 50.0);
    assert_eq!(dashboard["recent_items"].as_array().unwrap().len(), 2);
}
