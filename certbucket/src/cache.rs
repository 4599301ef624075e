//! Certificate cache on top of an object-storage bucket.
//!
//! Object name = cache key, object body = the raw certificate bytes. The
//! cache keeps no state besides the backend handle; every call is a single
//! request to the bucket, so concurrent callers need no coordination here.

use crate::adapter::client::ObjectBackend;
use crate::adapter::s3::S3Backend;
use crate::config::StoreConfig;
use crate::error::{BackendError, CacheError};
use async_trait::async_trait;

/// Storage contract expected by TLS certificate automation.
///
/// `get` must report [`CacheError::CacheMiss`] when nothing is stored so the
/// caller knows to issue a fresh certificate.
#[async_trait]
pub trait CertCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Vec<u8>, CacheError>;

    async fn put(&self, key: &str, data: &[u8]) -> Result<(), CacheError>;

    /// Removing a key that is not there succeeds.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

pub struct CertBucketCache<B: ObjectBackend = S3Backend> {
    backend: B,
}

impl CertBucketCache<S3Backend> {
    /// Connects to Cloud Storage and makes sure `bucket` exists under
    /// `project_id`.
    pub async fn new(
        project_id: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Result<Self, CacheError> {
        Self::with_config(&StoreConfig::new(project_id, bucket)).await
    }

    pub async fn with_config(config: &StoreConfig) -> Result<Self, CacheError> {
        Self::with_backend(S3Backend::connect(config).await).await
    }
}

impl<B: ObjectBackend> CertBucketCache<B> {
    /// Wraps `backend`, creating its bucket if needed. A bucket we already
    /// own is fine; one owned by someone else is an error.
    pub async fn with_backend(backend: B) -> Result<Self, CacheError> {
        match backend.create_bucket().await {
            Ok(()) => tracing::info!(bucket = backend.bucket(), "created certificate bucket"),
            Err(BackendError::BucketOwnedByYou { .. }) => {
                tracing::debug!(bucket = backend.bucket(), "certificate bucket already exists")
            }
            Err(e) => return Err(e.into()),
        }
        Ok(Self { backend })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }
}

/// Rejects keys that are empty or could escape the bucket on a
/// path-based backend.
pub fn validate_key(key: &str) -> Result<(), CacheError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\0')
        || key.split(['/', '\\']).any(|seg| seg == "..");
    if bad {
        return Err(CacheError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[async_trait]
impl<B: ObjectBackend> CertCache for CertBucketCache<B> {
    async fn get(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        validate_key(key)?;
        match self.backend.get_object(key).await {
            Ok(data) => {
                tracing::debug!(bucket = self.backend.bucket(), key, len = data.len(), "cache hit");
                Ok(data)
            }
            Err(BackendError::NotFound { .. }) => {
                tracing::debug!(bucket = self.backend.bucket(), key, "cache miss");
                Err(CacheError::CacheMiss)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, data: &[u8]) -> Result<(), CacheError> {
        validate_key(key)?;
        self.backend.put_object(key, data).await?;
        tracing::debug!(bucket = self.backend.bucket(), key, len = data.len(), "stored certificate");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        validate_key(key)?;
        match self.backend.delete_object(key).await {
            Ok(()) | Err(BackendError::NotFound { .. }) => {
                tracing::debug!(bucket = self.backend.bucket(), key, "deleted certificate");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::localfs::LocalFsBackend;
    use std::collections::HashMap;
    use std::io;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MemoryBackend {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        create_result: Mutex<Option<BackendError>>,
        fail_with: Mutex<Option<io::ErrorKind>>,
    }

    impl MemoryBackend {
        fn failure(&self, op: &'static str) -> Option<BackendError> {
            self.fail_with
                .lock()
                .unwrap()
                .map(|kind| BackendError::request(op, io::Error::new(kind, "injected")))
        }
    }

    #[async_trait]
    impl ObjectBackend for MemoryBackend {
        fn bucket(&self) -> &str {
            "mem"
        }

        async fn create_bucket(&self) -> Result<(), BackendError> {
            match self.create_result.lock().unwrap().take() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }

        async fn delete_bucket(&self) -> Result<(), BackendError> {
            Ok(())
        }

        async fn get_object(&self, key: &str) -> Result<Vec<u8>, BackendError> {
            if let Some(e) = self.failure("get_object") {
                return Err(e);
            }
            self.objects
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| BackendError::NotFound {
                    key: key.to_string(),
                })
        }

        async fn put_object(&self, key: &str, data: &[u8]) -> Result<(), BackendError> {
            if let Some(e) = self.failure("put_object") {
                return Err(e);
            }
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_string(), data.to_vec());
            Ok(())
        }

        async fn delete_object(&self, key: &str) -> Result<(), BackendError> {
            if let Some(e) = self.failure("delete_object") {
                return Err(e);
            }
            match self.objects.lock().unwrap().remove(key) {
                Some(_) => Ok(()),
                None => Err(BackendError::NotFound {
                    key: key.to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn existing_owned_bucket_is_accepted() {
        let backend = MemoryBackend::default();
        *backend.create_result.lock().unwrap() = Some(BackendError::BucketOwnedByYou {
            bucket: "mem".to_string(),
        });
        assert!(CertBucketCache::with_backend(backend).await.is_ok());
    }

    #[tokio::test]
    async fn bucket_owned_elsewhere_is_rejected() {
        let backend = MemoryBackend::default();
        *backend.create_result.lock().unwrap() = Some(BackendError::BucketTaken {
            bucket: "mem".to_string(),
        });
        let err = CertBucketCache::with_backend(backend).await.err().unwrap();
        assert!(matches!(
            err,
            CacheError::Backend(BackendError::BucketTaken { .. })
        ));
    }

    #[tokio::test]
    async fn other_create_failures_propagate() {
        let backend = MemoryBackend::default();
        *backend.create_result.lock().unwrap() = Some(BackendError::request(
            "create_bucket",
            io::Error::new(io::ErrorKind::PermissionDenied, "forbidden"),
        ));
        let err = CertBucketCache::with_backend(backend).await.err().unwrap();
        assert_eq!(err.to_string(), "create_bucket failed: forbidden");
    }

    #[tokio::test]
    async fn backend_failures_are_not_cache_misses() {
        let cache = CertBucketCache::with_backend(MemoryBackend::default())
            .await
            .unwrap();
        *cache.backend().fail_with.lock().unwrap() = Some(io::ErrorKind::ConnectionReset);

        let err = cache.get("example.com").await.unwrap_err();
        assert!(!err.is_miss());
        assert!(matches!(err, CacheError::Backend(BackendError::Request { operation: "get_object", .. })));
        assert!(cache.put("example.com", b"pem").await.is_err());
        assert!(cache.delete("example.com").await.is_err());
    }

    #[tokio::test]
    async fn overwrite_keeps_latest_value() {
        let cache = CertBucketCache::with_backend(MemoryBackend::default())
            .await
            .unwrap();
        cache.put("example.com", b"v1").await.unwrap();
        cache.put("example.com", b"v2").await.unwrap();
        assert_eq!(cache.get("example.com").await.unwrap(), b"v2");
    }

    #[tokio::test]
    async fn invalid_keys_never_reach_backend() {
        let cache = CertBucketCache::with_backend(MemoryBackend::default())
            .await
            .unwrap();
        for key in ["", "/etc/passwd", "../escape", "a/../../b", "nul\0key"] {
            assert!(matches!(
                cache.put(key, b"x").await,
                Err(CacheError::InvalidKey(_))
            ));
            assert!(matches!(cache.get(key).await, Err(CacheError::InvalidKey(_))));
        }
        assert!(cache.backend().objects.lock().unwrap().is_empty());
    }

    #[test]
    fn validate_key_accepts_certificate_names() {
        for key in ["example.com", "example.com+rsa", "acme_account+key", "*.example.com", "a..b"] {
            assert!(validate_key(key).is_ok(), "{key}");
        }
    }

    #[tokio::test]
    async fn cert_cache_lifecycle_on_local_bucket() {
        let dir = TempDir::new().unwrap();
        let bucket = "proj_autocert-cache-bucket";
        let cache = CertBucketCache::with_backend(LocalFsBackend::new(dir.path(), bucket))
            .await
            .unwrap();
        // constructing again over the same bucket must not fail
        CertBucketCache::with_backend(LocalFsBackend::new(dir.path(), bucket))
            .await
            .unwrap();

        let key = "your_cert_key";
        let value = b"your_cert_data";

        assert!(cache.get(key).await.unwrap_err().is_miss());
        cache.delete(key).await.unwrap();
        cache.put(key, value).await.unwrap();
        assert_eq!(cache.get(key).await.unwrap(), value);
        cache.delete(key).await.unwrap();
        assert!(cache.get(key).await.unwrap_err().is_miss());

        cache.into_backend().delete_bucket().await.unwrap();
    }

    #[tokio::test]
    async fn usable_as_trait_object() {
        let dir = TempDir::new().unwrap();
        let cache: Box<dyn CertCache> = Box::new(
            CertBucketCache::with_backend(LocalFsBackend::new(dir.path(), "certs"))
                .await
                .unwrap(),
        );
        cache.put("k", &[0, 159, 146, 150]).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), vec![0, 159, 146, 150]);
    }
}
