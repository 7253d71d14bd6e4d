use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::primitives::ByteStream;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::ApiError;

// 1. StorageService Contract
/// StorageService
///
/// Defines the abstract contract for all interactions with the object storage
/// layer. This trait allows us to swap the concrete implementation—from the
/// real S3 client (S3StorageClient) in production to the in-memory Mock
/// (MockStorageService) during testing—without affecting the calling handlers.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Ensures the configured bucket exists. Used primarily in the `Env::Local`
    /// setup to automatically provision the required bucket in MinIO. No-op in
    /// production.
    async fn ensure_bucket_exists(&self);

    /// Stores the processed image bytes under the given key with the given
    /// content type. The error payload is opaque; callers decide whether to
    /// retry under a collision-resistant key or fall back to local disk.
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), String>;

    /// Public, unauthenticated URL for a stored object.
    fn public_url(&self, key: &str) -> String;
}

/// StorageState
///
/// The concrete type used to share the storage service access across the application state.
pub type StorageState = Arc<dyn StorageService>;

// 2. The Real Implementation (S3/MinIO/managed storage)
/// S3StorageClient
///
/// The concrete implementation using the AWS SDK for S3. Due to S3
/// compatibility, this client transparently handles connections to:
/// - **Local:** Dockerized MinIO instance.
/// - **Production:** the managed storage gateway.
///
/// The `force_path_style(true)` is critical for MinIO and managed-gateway
/// compatibility.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    endpoint: String,
    bucket_name: String,
}

impl S3StorageClient {
    /// new
    ///
    /// Constructs the S3 client using credentials and configuration from AppConfig.
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            // CRITICAL: Forces the client to use path-style addressing (e.g. http://endpoint/bucket/key)
            // which is required for MinIO and managed storage gateways.
            .force_path_style(true)
            .build();

        let client = s3::Client::from_conf(config);

        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    /// ensure_bucket_exists
    ///
    /// Calls the S3 CreateBucket API. Since S3 APIs are idempotent, this only
    /// creates the bucket if it does not already exist. It's safe to call at startup.
    async fn ensure_bucket_exists(&self) {
        let _ = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await;
    }

    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), String> {
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        // Path-style addressing mirrors how the client itself talks to the store.
        format!("{}/{}/{}", self.endpoint, self.bucket_name, key)
    }
}

/// sanitize_key
///
/// Utility function to prevent path traversal attacks by removing directory
/// navigation components (e.g., `..`, `.`) from a user-provided key segment.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// resolve_upload_path
///
/// Maps a request path onto the local uploads root for the filesystem
/// fallback. Any navigation component (or a resolved location outside the
/// root) is rejected, so the read-back endpoint can never serve files outside
/// the designated directory.
pub fn resolve_upload_path(root: &Path, rel: &str) -> Result<PathBuf, ApiError> {
    let mut resolved = root.to_path_buf();
    for segment in rel.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." || segment.contains('\\') {
            return Err(ApiError::Forbidden("Access denied".to_string()));
        }
        resolved.push(segment);
    }
    if !resolved.starts_with(root) {
        return Err(ApiError::Forbidden("Access denied".to_string()));
    }
    Ok(resolved)
}

// 3. The Mock Implementation (For Unit Tests)
/// MockStorageService
///
/// A mock implementation of `StorageService` used exclusively for unit and
/// integration testing. Uploaded objects are held in memory so tests can
/// assert on what was stored; a failing variant simulates an unavailable
/// object store to exercise the local-disk fallback.
#[derive(Default)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            objects: Mutex::new(HashMap::new()),
        }
    }

    /// The stored bytes for a key, for test assertions.
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn object_keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {
        // No-op in mock environment.
    }

    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), String> {
        if self.should_fail {
            return Err("Mock Storage Error: Simulation requested".to_string());
        }
        let sanitized_key = sanitize_key(key);
        self.objects.lock().unwrap().insert(sanitized_key, bytes);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "http://localhost:9000/mock-bucket/{}",
            sanitize_key(key)
        )
    }
}
