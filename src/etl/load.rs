//! Load step
//!
//! Hands the warehouse a declarative load request for the transformed CSV
//! object. The step owns no ingestion mechanics; it pins the request
//! parameters and propagates the service's verdict.

use super::Step;
use crate::error::Result;
use crate::warehouse::{LoadRequest, Warehouse};

/// Requests the truncate-and-replace load of the transformed table.
pub struct Loader<W> {
    warehouse: W,
    request: LoadRequest,
}

impl<W> Loader<W>
where
    W: Warehouse,
{
    pub fn new(warehouse: W, request: LoadRequest) -> Self {
        Self { warehouse, request }
    }

    /// The load request this step will submit.
    pub fn request(&self) -> &LoadRequest {
        &self.request
    }
}

impl<W> Step for Loader<W>
where
    W: Warehouse,
{
    fn name(&self) -> &'static str {
        "load"
    }

    async fn run(&self) -> Result<()> {
        log::info!(
            "Requesting load of {} into {}",
            self.request.source_uri,
            self.request.table
        );
        self.warehouse.load_table(&self.request).await
    }
}
