//! Market snapshot data model
//!
//! The raw snapshot is an ordered JSON array of open-ended asset objects;
//! `AssetRow` is the fixed six-column projection loaded into the warehouse.

mod asset;

pub use asset::{AssetRow, CSV_HEADER};
