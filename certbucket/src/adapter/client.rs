//! Backend abstraction consumed by the certificate cache.

use crate::error::BackendError;
use async_trait::async_trait;

/// Minimal object-store surface: one bucket, whole-object reads and writes.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Name of the bucket this backend addresses.
    fn bucket(&self) -> &str;

    /// Creates the bucket. Reports `BucketOwnedByYou` / `BucketTaken` when it
    /// already exists.
    async fn create_bucket(&self) -> Result<(), BackendError>;

    /// Removes the (empty) bucket.
    async fn delete_bucket(&self) -> Result<(), BackendError>;

    /// Reads the full object. Reports `NotFound` when there is none.
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, BackendError>;

    /// Writes the full object, replacing any previous content.
    async fn put_object(&self, key: &str, data: &[u8]) -> Result<(), BackendError>;

    /// Deletes the object. Reports `NotFound` when the service says so.
    async fn delete_object(&self, key: &str) -> Result<(), BackendError>;
}
