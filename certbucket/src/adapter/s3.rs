//! S3-compatible adapter on aws-sdk-s3. Pointed at the Cloud Storage XML API
//! by default; any S3-speaking endpoint works.

use crate::adapter::client::ObjectBackend;
use crate::config::StoreConfig;
use crate::error::BackendError;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use tokio::io::AsyncReadExt;

/// Header the Cloud Storage XML API reads the owning project from.
const PROJECT_HEADER: &str = "x-goog-project-id";

const NO_SUCH_KEY: &str = "NoSuchKey";
const NO_SUCH_BUCKET: &str = "NoSuchBucket";

pub struct S3Backend {
    client: Client,
    bucket: String,
    project_id: String,
}

impl S3Backend {
    /// Builds a client from the explicit configuration. Credentials still
    /// come from the SDK's provider chain.
    pub async fn connect(config: &StoreConfig) -> Self {
        let sdk_conf = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region().to_string()))
            .endpoint_url(config.endpoint())
            .load()
            .await;
        let s3_conf = aws_sdk_s3::config::Builder::from(&sdk_conf)
            .force_path_style(config.force_path_style)
            .build();
        tracing::debug!(
            endpoint = config.endpoint(),
            region = config.region(),
            bucket = %config.bucket,
            "configured object storage client"
        );
        Self::from_client(Client::from_conf(s3_conf), config)
    }

    /// Wraps a client the caller has already configured.
    pub fn from_client(client: Client, config: &StoreConfig) -> Self {
        Self {
            client,
            bucket: config.bucket.clone(),
            project_id: config.project_id.clone(),
        }
    }
}

fn status_of<E>(err: &SdkError<E>) -> Option<u16> {
    err.raw_response().map(|r| r.status().as_u16())
}

/// A missing object, as opposed to a missing bucket. Bodiless 404s carry no
/// error code and count as a missing object.
fn is_missing_object<E: ProvideErrorMetadata>(err: &SdkError<E>) -> bool {
    match err.code() {
        Some(NO_SUCH_KEY) => true,
        Some(NO_SUCH_BUCKET) => false,
        _ => status_of(err) == Some(404),
    }
}

#[async_trait]
impl ObjectBackend for S3Backend {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn create_bucket(&self) -> Result<(), BackendError> {
        let project_id = self.project_id.clone();
        let res = self
            .client
            .create_bucket()
            .bucket(&self.bucket)
            .customize()
            .mutate_request(move |req| {
                req.headers_mut().insert(PROJECT_HEADER, project_id.clone());
            })
            .send()
            .await;
        match res {
            Ok(_) => Ok(()),
            Err(e) => {
                if let Some(service_err) = e.as_service_error() {
                    if service_err.is_bucket_already_owned_by_you() {
                        return Err(BackendError::BucketOwnedByYou {
                            bucket: self.bucket.clone(),
                        });
                    }
                    if service_err.is_bucket_already_exists() {
                        return Err(BackendError::BucketTaken {
                            bucket: self.bucket.clone(),
                        });
                    }
                }
                Err(BackendError::request("create_bucket", e))
            }
        }
    }

    async fn delete_bucket(&self) -> Result<(), BackendError> {
        self.client
            .delete_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| BackendError::request("delete_bucket", e))?;
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, BackendError> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;
        match resp {
            Ok(o) => {
                let mut body = o.body.into_async_read();
                let mut buf = Vec::new();
                body.read_to_end(&mut buf).await?;
                Ok(buf)
            }
            Err(e) => {
                let missing = e.as_service_error().is_some_and(|se| se.is_no_such_key())
                    || is_missing_object(&e);
                if missing {
                    Err(BackendError::NotFound {
                        key: key.to_string(),
                    })
                } else {
                    Err(BackendError::request("get_object", e))
                }
            }
        }
    }

    async fn put_object(&self, key: &str, data: &[u8]) -> Result<(), BackendError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data.to_owned()))
            .send()
            .await
            .map_err(|e| BackendError::request("put_object", e))?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), BackendError> {
        // S3 answers 204 for missing keys; Cloud Storage answers 404 NoSuchKey.
        match self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_missing_object(&e) => {
                Err(BackendError::NotFound {
                    key: key.to_string(),
                })
            }
            Err(e) => Err(BackendError::request("delete_object", e)),
        }
    }
}
