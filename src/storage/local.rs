//! Directory-backed object storage
//!
//! Lays objects out as `{root}/{bucket}/{key}` on the local filesystem.
//! Used by the test suite and for local dry runs; the semantics match the
//! remote store: fixed keys, full overwrite, no history.

use super::ObjectStore;
use crate::error::{PipelineError, Result};
use std::path::{Path, PathBuf};

/// Object store backed by a local directory tree.
#[derive(Clone, Debug)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Filesystem path of an object.
    pub fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.root.join(bucket).join(key)
    }
}

impl ObjectStore for LocalStore {
    async fn download(&self, bucket: &str, key: &str) -> Result<String> {
        let path = self.object_path(bucket, key);
        std::fs::read_to_string(&path).map_err(|e| PipelineError::StorageRead {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    async fn upload(&self, bucket: &str, key: &str, _content_type: &str, body: String) -> Result<()> {
        let path = self.object_path(bucket, key);
        let write_err = |reason: String| PipelineError::StorageWrite {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        std::fs::write(&path, body).map_err(|e| write_err(e.to_string()))
    }
}
