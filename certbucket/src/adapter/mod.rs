//! Object-storage adapters
//!
//! Submodules:
//! - `client`: the `ObjectBackend` trait the certificate cache is written against
//! - `s3`: S3-compatible adapter (Cloud Storage XML API, MinIO, AWS) on aws-sdk-s3
//! - `localfs`: directory-backed adapter for offline use and tests
//!
//! Adapters translate service-specific "not found" and "bucket exists"
//! conditions into `BackendError` variants and pass every other failure
//! through unchanged. They do not retry.
pub mod client;
pub mod localfs;
pub mod s3;
