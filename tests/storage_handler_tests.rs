use chrono::Utc;
use image::codecs::png::PngEncoder;
use image::{Rgba, RgbaImage};
use lostfound_portal::{
    AppConfig, AppState, MockIdentityService, MockRepository, MockStorageService, create_router,
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
    storage: Arc<MockStorageService>,
    user_id: Uuid,
    // Keeps the temp uploads root alive for the app's lifetime.
    _uploads_root: tempfile::TempDir,
    uploads_dir: String,
}

async fn spawn_app(storage: MockStorageService) -> TestApp {
    let uploads_root = tempfile::tempdir().expect("tempdir");
    let uploads_dir = uploads_root.path().to_str().unwrap().to_string();

    let repo = Arc::new(MockRepository::new());
    let user_id = Uuid::new_v4();
    repo.create_profile(Profile {
        id: user_id,
        first_name: "Uppy".to_string(),
        last_name: "Loader".to_string(),
        user_type: "STUDENT".to_string(),
        account_status: "ACTIVE".to_string(),
        email_verified: true,
        created_at: Utc::now(),
    })
    .await
    .expect("seed profile");

    let storage = Arc::new(storage);
    let state = AppState {
        repo: repo.clone() as RepositoryState,
        admin: repo as AdminRepositoryState,
        identity: Arc::new(MockIdentityService::new()) as IdentityState,
        storage: storage.clone() as StorageState,
        config: AppConfig {
            uploads_dir: uploads_dir.clone(),
            ..AppConfig::default()
        },
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        storage,
        user_id,
        _uploads_root: uploads_root,
        uploads_dir,
    }
}

fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([0, 128, 255, 255]));
    let mut out = Vec::new();
    img.write_with_encoder(PngEncoder::new(&mut out)).unwrap();
    out
}

fn multipart_png(bytes: Vec<u8>) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name("upload.png")
        .mime_str("image/png")
        .unwrap();
    reqwest::multipart::Form::new().part("file", part)
}

#[tokio::test]
async fn upload_stores_under_the_uploaders_folder() {
    let app = spawn_app(MockStorageService::new()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/upload", app.address))
        .header("x-user-id", app.user_id.to_string())
        .multipart(multipart_png(png_fixture(64, 64)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    let path = body["path"].as_str().unwrap();
    assert!(path.starts_with(&app.user_id.to_string()));
    assert!(path.ends_with(".png"));
    assert!(body["public_url"].as_str().unwrap().contains("mock-bucket"));

    // The processed bytes actually landed in the object store.
    let keys = app.storage.object_keys();
    assert_eq!(keys.len(), 1);
    let stored = app.storage.object(&keys[0]).unwrap();
    let decoded = image::load_from_memory(&stored).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (64, 64));
}

#[tokio::test]
async fn upload_falls_back_to_local_disk_when_storage_is_down() {
    let app = spawn_app(MockStorageService::new_failing()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/upload", app.address))
        .header("x-user-id", app.user_id.to_string())
        .multipart(multipart_png(png_fixture(32, 32)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    let rel = body["path"].as_str().unwrap();
    assert!(body["url"].as_str().unwrap().contains("/uploads/"));

    // The same bytes live under the uploads root, in a per-user subdirectory.
    let on_disk = std::path::Path::new(&app.uploads_dir).join(rel);
    assert!(on_disk.exists());

    // And the read-back path serves them with an image content type.
    let served = client
        .get(format!("{}/uploads/{}", app.address, rel))
        .send()
        .await
        .unwrap();
    assert_eq!(served.status(), 200);
    assert_eq!(
        served.headers()["content-type"].to_str().unwrap(),
        "image/png"
    );
    let served_bytes = served.bytes().await.unwrap();
    assert!(image::load_from_memory(&served_bytes).is_ok());
}

#[tokio::test]
async fn serve_rejects_path_traversal() {
    let app = spawn_app(MockStorageService::new()).await;
    let client = reqwest::Client::new();

    // Encoded traversal survives client-side normalization and must be
    // rejected by the resolver, not the router.
    let response = client
        .get(format!("{}/uploads/..%2F..%2Fetc%2Fpasswd", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn serve_unknown_image_is_not_found() {
    let app = spawn_app(MockStorageService::new()).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/uploads/{}/missing.png", app.address, Uuid::new_v4()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn upload_rejects_unsupported_content_type() {
    let app = spawn_app(MockStorageService::new()).await;
    let client = reqwest::Client::new();

    let part = reqwest::multipart::Part::bytes(b"hello".to_vec())
        .file_name("notes.txt")
        .mime_str("text/plain")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("file", part);

    let response = client
        .post(format!("{}/upload", app.address))
        .header("x-user-id", app.user_id.to_string())
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn upload_requires_authentication() {
    let app = spawn_app(MockStorageService::new()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/upload", app.address))
        .multipart(multipart_png(png_fixture(8, 8)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn upload_rejects_oversized_files() {
    let app = spawn_app(MockStorageService::new()).await;
    let client = reqwest::Client::new();

    // One byte over the 10 MiB ceiling, declared as png.
    let oversized = vec![0u8; 10 * 1024 * 1024 + 1];
    let response = client
        .post(format!("{}/upload", app.address))
        .header("x-user-id", app.user_id.to_string())
        .multipart(multipart_png(oversized))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}
