use std::error::Error as StdError;
use std::io;

use thiserror::Error;

/// Boxed error carried by backend failures, the same shape the adapters
/// have always returned.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Conditions reported by an [`ObjectBackend`](crate::adapter::client::ObjectBackend).
///
/// The first three variants are the distinguished outcomes the cache layer
/// classifies; everything else is carried verbatim in `Request` or `Io`.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("object {key} not found")]
    NotFound { key: String },

    #[error("bucket {bucket} already exists and is owned by you")]
    BucketOwnedByYou { bucket: String },

    #[error("bucket {bucket} already exists and is owned by another account")]
    BucketTaken { bucket: String },

    #[error("{operation} failed: {source}")]
    Request {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl BackendError {
    pub fn request<E>(operation: &'static str, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Request {
            operation,
            source: Box::new(source),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors returned by [`CertCache`](crate::cache::CertCache) implementations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// No certificate is stored under the key; the caller should issue one.
    #[error("certificate cache miss")]
    CacheMiss,

    #[error("invalid cache key {0:?}")]
    InvalidKey(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl CacheError {
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::CacheMiss)
    }
}
