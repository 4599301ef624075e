use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, Subcommand};

use certbucket::{StoreConfig, default_bucket_name};

#[derive(Parser, Debug)]
#[command(name = "certbucket")]
#[command(version, about = "Inspect a TLS certificate cache stored in a bucket", long_about = None)]
pub(crate) struct Args {
    /// Project that owns the bucket, not needed with `--local`
    #[arg(long, env = "CERTBUCKET_PROJECT_ID")]
    pub(crate) project: Option<String>,

    /// Fallback for `--project`
    #[arg(long, env = "GOOGLE_PROJECT_ID", hide = true)]
    pub(crate) google_project_id: Option<String>,

    /// Bucket name, defaults to `<project>_autocert-cache-bucket`
    #[arg(long, env = "CERTBUCKET_BUCKET")]
    pub(crate) bucket: Option<String>,

    /// S3-compatible endpoint
    #[arg(long, env = "CERTBUCKET_ENDPOINT")]
    pub(crate) endpoint: Option<String>,

    /// Region sent to the endpoint
    #[arg(long, env = "CERTBUCKET_REGION")]
    pub(crate) region: Option<String>,

    /// Address buckets by path instead of virtual host
    #[arg(long, env = "CERTBUCKET_PATH_STYLE", default_value_t = false)]
    pub(crate) path_style: bool,

    /// Keep the bucket in a local directory instead of object storage
    #[arg(long, env = "CERTBUCKET_LOCAL_ROOT", value_name = "DIR")]
    pub(crate) local: Option<PathBuf>,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    #[command(about = "Create the bucket if it does not exist yet")]
    Ensure,
    #[command(about = "Print the cached bytes for a key (exit code 2 on cache miss)")]
    Get {
        #[arg(value_name = "KEY")]
        key: String,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    #[command(about = "Store bytes under a key, read from a file or stdin")]
    Put {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    #[command(about = "Remove a key; removing a missing key succeeds")]
    Delete {
        #[arg(value_name = "KEY")]
        key: String,
    },
}

impl Args {
    pub(crate) fn project_id(&self) -> Option<&str> {
        self.project
            .as_deref()
            .or(self.google_project_id.as_deref())
    }

    pub(crate) fn store_config(&self) -> anyhow::Result<StoreConfig> {
        let project = self.project_id();
        if project.is_none() && self.local.is_none() {
            bail!("a project is required: pass --project or set CERTBUCKET_PROJECT_ID / GOOGLE_PROJECT_ID");
        }
        let bucket = match (&self.bucket, project) {
            (Some(bucket), _) => bucket.clone(),
            (None, Some(project)) => default_bucket_name(project),
            (None, None) => bail!("--bucket is required when no project is given"),
        };
        let mut config = StoreConfig::new(project.unwrap_or_default(), bucket)
            .with_path_style(self.path_style);
        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint.clone());
        }
        if let Some(region) = &self.region {
            config = config.with_region(region.clone());
        }
        Ok(config)
    }
}
