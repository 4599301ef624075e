use std::process::ExitCode;

use clap::Parser;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::EnvFilter;

use certbucket::{CacheError, CertBucketCache, CertCache, LocalFsBackend};
use cli::{Args, Command};

mod cli;

/// Exit code for `get` when the key is not cached.
const EXIT_MISS: u8 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.store_config()?;
    let cache: Box<dyn CertCache> = match &args.local {
        Some(root) => Box::new(
            CertBucketCache::with_backend(LocalFsBackend::new(root, config.bucket.clone()))
                .await?,
        ),
        None => Box::new(CertBucketCache::with_config(&config).await?),
    };

    match args.command {
        Command::Ensure => {
            tracing::info!(bucket = %config.bucket, "bucket ready");
        }
        Command::Get { key, output } => {
            let data = match cache.get(&key).await {
                Ok(data) => data,
                Err(CacheError::CacheMiss) => {
                    tracing::info!(key = %key, "cache miss");
                    return Ok(ExitCode::from(EXIT_MISS));
                }
                Err(e) => return Err(e.into()),
            };
            match output {
                Some(path) => tokio::fs::write(path, &data).await?,
                None => {
                    let mut stdout = tokio::io::stdout();
                    stdout.write_all(&data).await?;
                    stdout.flush().await?;
                }
            }
        }
        Command::Put { key, input } => {
            let data = match input {
                Some(path) => tokio::fs::read(path).await?,
                None => {
                    let mut buf = Vec::new();
                    tokio::io::stdin().read_to_end(&mut buf).await?;
                    buf
                }
            };
            cache.put(&key, &data).await?;
            tracing::info!(key = %key, len = data.len(), "stored");
        }
        Command::Delete { key } => {
            cache.delete(&key).await?;
            tracing::info!(key = %key, "deleted");
        }
    }
    Ok(ExitCode::SUCCESS)
}
