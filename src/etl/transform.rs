//! Transform step
//!
//! Projects the staged snapshot into the fixed six-column CSV and stages
//! it at the transformed key. The CSV is built in a local scratch file and
//! uploaded only once fully written, so no partial object ever reaches the
//! store.

use super::Step;
use crate::error::Result;
use crate::market::{AssetRow, CSV_HEADER};
use crate::storage::ObjectStore;
use serde_json::Value;
use std::path::PathBuf;

/// Projects the raw snapshot into the transformed CSV object.
pub struct Transformer<S> {
    store: S,
    source_bucket: String,
    raw_key: String,
    staging_bucket: String,
    transformed_key: String,
    scratch_dir: PathBuf,
}

impl<S> Transformer<S>
where
    S: ObjectStore,
{
    /// # Arguments
    /// * `store` - staging object store
    /// * `source_bucket` / `raw_key` - where the fetch step staged the snapshot
    /// * `staging_bucket` / `transformed_key` - where the CSV object goes
    pub fn new(
        store: S,
        source_bucket: impl Into<String>,
        raw_key: impl Into<String>,
        staging_bucket: impl Into<String>,
        transformed_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            source_bucket: source_bucket.into(),
            raw_key: raw_key.into(),
            staging_bucket: staging_bucket.into(),
            transformed_key: transformed_key.into(),
            scratch_dir: std::env::temp_dir(),
        }
    }

    /// Override the scratch directory (defaults to the system temp dir).
    pub fn with_scratch_dir(mut self, scratch_dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = scratch_dir.into();
        self
    }

    async fn transform(&self) -> Result<()> {
        let raw = self
            .store
            .download(&self.source_bucket, &self.raw_key)
            .await?;
        let records: Vec<Value> = serde_json::from_str(&raw)?;

        log::debug!("Projecting {} asset record(s)", records.len());

        // The scratch file is removed on drop, whether the upload below
        // succeeds or not. If creation itself fails there is nothing to
        // clean up.
        let mut scratch = tempfile::NamedTempFile::new_in(&self.scratch_dir)?;
        {
            let mut writer = csv::Writer::from_writer(scratch.as_file_mut());
            writer.write_record(CSV_HEADER)?;
            for (index, record) in records.iter().enumerate() {
                let row = AssetRow::project(index, record)?;
                writer.write_record(row.fields())?;
            }
            writer.flush()?;
        }

        let table = std::fs::read_to_string(scratch.path())?;
        self.store
            .upload(&self.staging_bucket, &self.transformed_key, "text/csv", table)
            .await?;

        log::info!(
            "Staged transformed table at gs://{}/{} ({} row(s) + header)",
            self.staging_bucket,
            self.transformed_key,
            records.len()
        );
        Ok(())
    }
}

impl<S> Step for Transformer<S>
where
    S: ObjectStore,
{
    fn name(&self) -> &'static str {
        "transform"
    }

    async fn run(&self) -> Result<()> {
        self.transform().await
    }
}
