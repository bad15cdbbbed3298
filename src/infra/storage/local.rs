//! Filesystem blob store served under the public uploads path.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{info, instrument};

use crate::domain::{AppError, BlobStore, StorageError, StoredBlob};

pub struct LocalBlobStore {
    root: PathBuf,
    public_path: String,
}

impl LocalBlobStore {
    /// `public_path` is the URL prefix the root directory is served under.
    pub async fn new(root: impl Into<PathBuf>, public_path: impl Into<String>) -> Result<Self, AppError> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(StorageError::from)?;
        info!(root = %root.display(), "local blob store ready");
        Ok(Self {
            root,
            public_path: public_path.into().trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, pathname: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(pathname);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || pathname.is_empty() {
            return Err(StorageError::InvalidPath(pathname.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn put(
        &self,
        pathname: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StoredBlob, AppError> {
        let target = self.resolve(pathname)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(StorageError::from)?;
        }
        fs::write(&target, bytes).await.map_err(StorageError::from)?;

        Ok(StoredBlob {
            url: format!("{}/{pathname}", self.public_path),
            pathname: pathname.to_string(),
            content_type: content_type.to_string(),
            size: bytes.len(),
        })
    }

    async fn health_check(&self) -> Result<(), AppError> {
        let meta = fs::metadata(&self.root).await.map_err(StorageError::from)?;
        if !meta.is_dir() {
            return Err(StorageError::Io(format!("{} is not a directory", self.root.display())).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "/uploads/").await.unwrap();

        let blob = store
            .put("blog/cover-abc.png", "image/png", b"\x89PNG")
            .await
            .unwrap();

        assert_eq!(blob.url, "/uploads/blog/cover-abc.png");
        assert_eq!(blob.size, 4);
        let written = std::fs::read(dir.path().join("blog/cover-abc.png")).unwrap();
        assert_eq!(written, b"\x89PNG");
        assert!(store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "/uploads").await.unwrap();

        for bad in ["../x.png", "/etc/x.png", ""] {
            let result = store.put(bad, "image/png", b"x").await;
            assert!(matches!(
                result,
                Err(AppError::Storage(StorageError::InvalidPath(_)))
            ));
        }
    }
}
