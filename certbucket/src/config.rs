/// Endpoint of the Cloud Storage XML API, which speaks the S3 protocol.
pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";
pub const DEFAULT_REGION: &str = "auto";

/// Bucket name used when the caller only supplies a project.
pub fn default_bucket_name(project_id: &str) -> String {
    format!("{project_id}_autocert-cache-bucket")
}

/// Explicit session configuration for the object-storage backend.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub project_id: String,
    pub bucket: String,
    /// S3-compatible endpoint; `None` means [`DEFAULT_ENDPOINT`].
    pub endpoint_url: Option<String>,
    pub region: Option<String>,
    pub force_path_style: bool,
}

impl StoreConfig {
    pub fn new(project_id: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            bucket: bucket.into(),
            endpoint_url: None,
            region: None,
            force_path_style: false,
        }
    }

    pub fn with_endpoint(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_path_style(mut self, force_path_style: bool) -> Self {
        self.force_path_style = force_path_style;
        self
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint_url.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }
}
