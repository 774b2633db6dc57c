//! Staging object storage
//!
//! Both pipeline staging artifacts (the raw JSON snapshot and the
//! transformed CSV) live at fixed bucket/key pairs, overwritten on every
//! run. `GcsStore` talks to Google Cloud Storage; `LocalStore` backs the
//! test suite and local dry runs with a plain directory tree.

mod gcs;
mod local;

pub use gcs::{DEFAULT_GCS_URL, GcsStore};
pub use local::LocalStore;

use crate::error::Result;

/// A store of text objects addressed by bucket and key.
///
/// Uploads unconditionally overwrite: the staging layer keeps no history,
/// and each object write is atomic at the store level.
pub trait ObjectStore: Send + Sync {
    /// Download an object as text.
    ///
    /// # Errors
    /// Returns a storage read error if the object is missing or unreadable.
    fn download(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Upload an object, replacing any existing object at the same key.
    ///
    /// # Errors
    /// Returns a storage write error if the upload fails; no partial object
    /// is left behind.
    fn upload(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: String,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
