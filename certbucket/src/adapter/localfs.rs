//! Local directory backend: a bucket is a directory under `root`, an object is
//! a file inside it (implements ObjectBackend).
//!
//! Writes are staged in `root/.certbucket-tmp` and renamed into place, so a
//! half-written or abandoned staging file is never visible as an object.
//! Directories are an artifact of nested keys, never objects themselves.

use crate::adapter::client::ObjectBackend;
use crate::error::BackendError;
use async_trait::async_trait;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::{fs, io::AsyncWriteExt};

/// Staging directory under `root`; bucket names never start with a dot.
const TMP_DIR: &str = ".certbucket-tmp";

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

pub struct LocalFsBackend {
    root: PathBuf,
    bucket: String,
}

impl LocalFsBackend {
    pub fn new<P: AsRef<Path>>(root: P, bucket: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            bucket: bucket.into(),
        }
    }

    fn bucket_dir(&self) -> PathBuf {
        self.root.join(&self.bucket)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.bucket_dir().join(key)
    }

    fn tmp_dir(&self) -> PathBuf {
        self.root.join(TMP_DIR)
    }

    fn tmp_path(&self) -> PathBuf {
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        self.tmp_dir().join(format!("{}-{seq}", std::process::id()))
    }

    // A directory or a file standing in for a path component means there is
    // no object under that key.
    async fn is_missing(path: &Path, e: &io::Error) -> bool {
        match e.kind() {
            ErrorKind::NotFound | ErrorKind::NotADirectory | ErrorKind::IsADirectory => true,
            _ => fs::metadata(path).await.is_ok_and(|m| m.is_dir()),
        }
    }

    /// Removes now-empty directories between `path` and the bucket directory.
    async fn prune_empty_parents(&self, path: &Path) {
        let bucket_dir = self.bucket_dir();
        let mut dir = path.parent();
        while let Some(d) = dir {
            if d == bucket_dir || !d.starts_with(&bucket_dir) {
                break;
            }
            if fs::remove_dir(d).await.is_err() {
                break;
            }
            dir = d.parent();
        }
    }

    // A concurrent delete may prune the parent between create_dir_all and
    // rename, so recreate it and try again.
    async fn rename_into_place(tmp: &Path, path: &Path) -> io::Result<()> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir).await?;
            }
            match fs::rename(tmp, path).await {
                Err(e) if e.kind() == ErrorKind::NotFound && attempt < 3 => continue,
                res => return res,
            }
        }
    }
}

#[async_trait]
impl ObjectBackend for LocalFsBackend {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn create_bucket(&self) -> Result<(), BackendError> {
        fs::create_dir_all(&self.root).await?;
        match fs::create_dir(self.bucket_dir()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(BackendError::BucketOwnedByYou {
                bucket: self.bucket.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_bucket(&self) -> Result<(), BackendError> {
        fs::remove_dir(self.bucket_dir()).await?;
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, BackendError> {
        let path = self.path_for(key);
        match fs::read(&path).await {
            Ok(buf) => Ok(buf),
            Err(e) => {
                if Self::is_missing(&path, &e).await {
                    Err(BackendError::NotFound {
                        key: key.to_string(),
                    })
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn put_object(&self, key: &str, data: &[u8]) -> Result<(), BackendError> {
        let path = self.path_for(key);
        fs::create_dir_all(self.tmp_dir()).await?;
        let tmp = self.tmp_path();
        let written = async {
            let mut f = fs::File::create(&tmp).await?;
            f.write_all(data).await?;
            f.flush().await?;
            f.sync_all().await?;
            Self::rename_into_place(&tmp, &path).await
        }
        .await;
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), BackendError> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => {
                self.prune_empty_parents(&path).await;
                Ok(())
            }
            Err(e) => {
                if Self::is_missing(&path, &e).await {
                    Err(BackendError::NotFound {
                        key: key.to_string(),
                    })
                } else {
                    Err(e.into())
                }
            }
        }
    }
}
