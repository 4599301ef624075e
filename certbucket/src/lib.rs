//! certbucket: a TLS certificate cache stored in an object-storage bucket.
//!
//! [`CertBucketCache`] implements the [`CertCache`] get/put/delete contract on
//! top of any [`ObjectBackend`]; the default backend talks to Cloud Storage
//! through its S3-compatible API.

pub mod adapter;
pub mod cache;
pub mod config;
pub mod error;

pub use adapter::client::ObjectBackend;
pub use adapter::localfs::LocalFsBackend;
pub use adapter::s3::S3Backend;
pub use cache::{CertBucketCache, CertCache};
pub use config::{StoreConfig, default_bucket_name};
pub use error::{BackendError, CacheError};
