//! Pipeline error taxonomy
//!
//! Every step failure maps onto one of these variants. Steps log the error
//! with context and propagate it unchanged; retries happen at the pipeline
//! level, never inside a step.

use reqwest::StatusCode;

/// Errors raised by the fetch, transform, and load steps.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Transport-level failure reaching the market data API
    #[error("network error calling {endpoint}: {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The market data API answered with a non-success status
    #[error("{endpoint} returned HTTP {status}: {body}")]
    HttpStatus {
        endpoint: String,
        status: StatusCode,
        body: String,
    },

    /// A staging object could not be downloaded
    #[error("failed to read gs://{bucket}/{key}: {reason}")]
    StorageRead {
        bucket: String,
        key: String,
        reason: String,
    },

    /// A staging object could not be uploaded
    #[error("failed to write gs://{bucket}/{key}: {reason}")]
    StorageWrite {
        bucket: String,
        key: String,
        reason: String,
    },

    /// Malformed JSON in an API response or staged object
    #[error("failed to parse market snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    /// An asset record lacked one of the six projected fields
    #[error("asset record {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    /// The warehouse rejected or failed the load job
    #[error("warehouse load into {table} failed: {reason}")]
    WarehouseLoad { table: String, reason: String },

    /// Missing or malformed configuration, detected before any step runs
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Local scratch file I/O during the transform step
    #[error("scratch file error: {0}")]
    Scratch(#[from] std::io::Error),

    /// CSV serialization failure during the transform step
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
