//! Warehouse load interface
//!
//! The load step does not move bytes itself: it hands the warehouse a
//! declarative load request naming the staged CSV object and the
//! destination table, and the service does the rest. The request
//! parameters are load-bearing; everything here exists to pin them down.

mod bigquery;

pub use bigquery::{BigQueryClient, DEFAULT_BIGQUERY_URL};

use crate::error::{PipelineError, Result};
use std::str::FromStr;

/// Fully qualified BigQuery table identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableId {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl FromStr for TableId {
    type Err = PipelineError;

    /// Parse a `PROJECT.DATASET.TABLE` identifier.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            [project, dataset, table]
                if !project.is_empty() && !dataset.is_empty() && !table.is_empty() =>
            {
                Ok(Self {
                    project: project.to_string(),
                    dataset: dataset.to_string(),
                    table: table.to_string(),
                })
            }
            _ => Err(PipelineError::Config(format!(
                "invalid table identifier '{s}': expected PROJECT.DATASET.TABLE"
            ))),
        }
    }
}

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

/// How the destination table's existing rows are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteDisposition {
    /// Discard all existing rows, then write the new set
    #[default]
    Truncate,
    /// Append to existing rows
    Append,
    /// Fail unless the table is empty
    Empty,
}

impl WriteDisposition {
    /// Wire name used by the BigQuery API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Truncate => "WRITE_TRUNCATE",
            Self::Append => "WRITE_APPEND",
            Self::Empty => "WRITE_EMPTY",
        }
    }
}

/// A declarative CSV load request.
///
/// Defaults match the pipeline contract: one header row to skip, schema
/// autodetected from the header and sample rows, truncate-and-replace
/// write semantics. Atomicity of the replace is the service's promise,
/// not implemented here.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub source_uri: String,
    pub table: TableId,
    pub skip_leading_rows: u32,
    pub autodetect: bool,
    pub write_disposition: WriteDisposition,
}

impl LoadRequest {
    pub fn new(source_uri: impl Into<String>, table: TableId) -> Self {
        Self {
            source_uri: source_uri.into(),
            table,
            skip_leading_rows: 1,
            autodetect: true,
            write_disposition: WriteDisposition::Truncate,
        }
    }
}

/// A warehouse that can ingest staged CSV objects into tables.
pub trait Warehouse: Send + Sync {
    /// Run a load job to completion.
    ///
    /// # Errors
    /// Returns a warehouse load error if the service rejects the job or the
    /// job finishes with an error (schema mismatch, missing source object,
    /// permission failure).
    fn load_table(
        &self,
        request: &LoadRequest,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_id_round_trip() {
        let id: TableId = "my-project.crypto.market_data".parse().unwrap();
        assert_eq!(id.project, "my-project");
        assert_eq!(id.dataset, "crypto");
        assert_eq!(id.table, "market_data");
        assert_eq!(id.to_string(), "my-project.crypto.market_data");
    }

    #[test]
    fn test_table_id_rejects_bad_shapes() {
        for s in ["", "table", "dataset.table", "a.b.c.d", "a..c", ".b.c", "a.b."] {
            assert!(s.parse::<TableId>().is_err(), "accepted {s:?}");
        }
    }

    #[test]
    fn test_load_request_defaults() {
        let table: TableId = "p.d.t".parse().unwrap();
        let request = LoadRequest::new("gs://bucket/key.csv", table);
        assert_eq!(request.skip_leading_rows, 1);
        assert!(request.autodetect);
        assert_eq!(request.write_disposition, WriteDisposition::Truncate);
    }

    #[test]
    fn test_write_disposition_wire_names() {
        assert_eq!(WriteDisposition::Truncate.as_str(), "WRITE_TRUNCATE");
        assert_eq!(WriteDisposition::Append.as_str(), "WRITE_APPEND");
        assert_eq!(WriteDisposition::Empty.as_str(), "WRITE_EMPTY");
    }
}
