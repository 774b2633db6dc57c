//! Pipeline configuration
//!
//! All storage keys, bucket names, and the destination table are resolved
//! once from the environment before any step runs. Nothing in the step code
//! reads the environment directly.

use crate::error::{PipelineError, Result};
use crate::warehouse::TableId;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_RAW_KEY: &str = "coingecko/raw_data.json";
pub const DEFAULT_TRANSFORMED_KEY: &str = "coingecko/transformed_data.csv";

/// Resolved pipeline configuration.
///
/// Expected environment variables:
/// - `COINGECKO_URL`: API base URL (optional, defaults to the public API)
/// - `COINGECKO_API_KEY`: demo/pro API key (optional)
/// - `GCS_SOURCE_BUCKET`: bucket for the raw JSON snapshot (required)
/// - `GCS_STAGING_BUCKET`: bucket for the transformed CSV (required)
/// - `GCS_RAW_KEY`: object key for the raw snapshot (optional)
/// - `GCS_TRANSFORMED_KEY`: object key for the transformed CSV (optional)
/// - `BIGQUERY_TABLE_ID`: destination table as `PROJECT.DATASET.TABLE` (required)
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub api_url: Url,
    pub api_key: Option<String>,
    pub source_bucket: String,
    pub staging_bucket: String,
    pub raw_key: String,
    pub transformed_key: String,
    pub table_id: TableId,
}

impl PipelineConfig {
    /// Resolve the configuration from environment variables.
    ///
    /// # Errors
    /// Returns a configuration error if a required variable is unset or the
    /// table identifier is malformed. The destination table has no default;
    /// a pipeline without one is not usable and must fail here, not at load
    /// time.
    pub fn from_env() -> Result<Self> {
        let api_url = match std::env::var("COINGECKO_URL") {
            Ok(url) => Url::parse(&url)
                .map_err(|e| PipelineError::Config(format!("invalid COINGECKO_URL: {e}")))?,
            Err(_) => Url::parse(DEFAULT_API_URL)
                .map_err(|e| PipelineError::Config(format!("invalid default API URL: {e}")))?,
        };
        let api_key = std::env::var("COINGECKO_API_KEY").ok();

        let source_bucket = require("GCS_SOURCE_BUCKET")?;
        let staging_bucket = require("GCS_STAGING_BUCKET")?;
        let raw_key =
            std::env::var("GCS_RAW_KEY").unwrap_or_else(|_| DEFAULT_RAW_KEY.to_string());
        let transformed_key = std::env::var("GCS_TRANSFORMED_KEY")
            .unwrap_or_else(|_| DEFAULT_TRANSFORMED_KEY.to_string());

        let table_id = require("BIGQUERY_TABLE_ID")?.parse()?;

        Ok(Self {
            api_url,
            api_key,
            source_bucket,
            staging_bucket,
            raw_key,
            transformed_key,
            table_id,
        })
    }

    /// `gs://` URI of the raw snapshot object.
    pub fn raw_uri(&self) -> String {
        format!("gs://{}/{}", self.source_bucket, self.raw_key)
    }

    /// `gs://` URI of the transformed CSV object.
    pub fn transformed_uri(&self) -> String {
        format!("gs://{}/{}", self.staging_bucket, self.transformed_key)
    }
}

fn require(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| PipelineError::Config(format!("{name} environment variable not set")))
}
