use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use nextrip_transit::{Result, StorageLoader, TransitError};

/// [`StorageLoader`] keeping one file per key under a root directory
#[derive(Clone, Debug)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

fn storage_error(key: &str, error: std::io::Error) -> TransitError {
    TransitError::Storage(format!("{key}: {error}"))
}

impl StorageLoader for FsStorage {
    fn load<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>> {
        Box::pin(async move {
            tokio::fs::read(self.path(key))
                .await
                .map_err(|e| storage_error(key, e))
        })
    }

    fn save<'a>(
        &'a self,
        key: &'a str,
        data: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            tokio::fs::create_dir_all(&self.root)
                .await
                .map_err(|e| storage_error(key, e))?;
            tokio::fs::write(self.path(key), data)
                .await
                .map_err(|e| storage_error(key, e))
        })
    }

    fn exists<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async move { tokio::fs::try_exists(self.path(key)).await.unwrap_or(false) })
    }
}
