use lostfound_portal::storage::{
    MockStorageService, S3StorageClient, StorageService, resolve_upload_path, sanitize_key,
};
use std::path::Path;

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_put_and_read_back() {
        let mock = MockStorageService::new();
        let key = "user-1/photo.jpg";
        mock.put_object(key, vec![1, 2, 3], "image/jpeg")
            .await
            .expect("put should succeed");

        assert_eq!(mock.object(key), Some(vec![1, 2, 3]));

        let url = mock.public_url(key);
        assert!(url.contains("mock-bucket"));
        assert!(url.contains(key));
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockStorageService::new_failing();
        let result = mock.put_object("k", vec![0], "image/png").await;
        assert!(result.is_err());
        assert!(mock.object_keys().is_empty());
    }

    #[tokio::test]
    async fn test_mock_sanitizes_traversal_keys() {
        let mock = MockStorageService::new();
        mock.put_object("../../etc/passwd", vec![9], "text/plain")
            .await
            .unwrap();

        // The stored key and the public URL both lose the navigation parts.
        assert_eq!(mock.object("etc/passwd"), Some(vec![9]));
        assert!(!mock.public_url("../../etc/passwd").contains(".."));
    }
}

#[cfg(test)]
mod key_tests {
    use super::*;

    #[test]
    fn sanitize_strips_navigation_segments() {
        assert_eq!(sanitize_key("a/../b/./c"), "a/b/c");
        assert_eq!(sanitize_key("../../etc/passwd"), "etc/passwd");
        assert_eq!(sanitize_key("plain.jpg"), "plain.jpg");
    }

    #[test]
    fn resolve_rejects_parent_traversal() {
        let root = Path::new("uploads");
        assert!(resolve_upload_path(root, "user/img.png").is_ok());
        assert!(resolve_upload_path(root, "../secret.txt").is_err());
        assert!(resolve_upload_path(root, "user/../../secret.txt").is_err());
        assert!(resolve_upload_path(root, "user\\..\\secret").is_err());
    }

    #[test]
    fn resolve_stays_inside_the_root() {
        let root = Path::new("uploads");
        let path = resolve_upload_path(root, "u1//img.png").unwrap();
        assert!(path.starts_with(root));
        assert_eq!(path, Path::new("uploads/u1/img.png"));
    }
}

#[cfg(test)]
mod s3_tests {
    use super::*;

    #[tokio::test]
    async fn test_s3_client_creation() {
        let _client = S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "testkey",
            "testsecret",
            "testbucket",
        )
        .await;
        // Just testing that construction doesn't panic.
    }

    #[tokio::test]
    async fn test_s3_public_url_is_path_style() {
        let client = S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "testkey",
            "testsecret",
            "testbucket",
        )
        .await;

        let url = client.public_url("user-1/photo.jpg");
        assert_eq!(url, "http://localhost:9000/testbucket/user-1/photo.jpg");
    }
}
