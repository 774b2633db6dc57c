//! Fixed six-column asset projection

use crate::error::{PipelineError, Result};
use serde_json::Value;

/// Header row of the transformed CSV, in projection order.
pub const CSV_HEADER: [&str; 6] = [
    "id",
    "symbol",
    "name",
    "current_price",
    "market_cap",
    "total_volume",
];

/// One transformed row: the six projected fields of an asset record,
/// rendered as CSV field text.
///
/// Rendering is deterministic so identical snapshots produce byte-identical
/// CSV objects: strings are written raw, numbers in serde_json's canonical
/// form, and JSON `null` as an empty field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRow {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: String,
    pub market_cap: String,
    pub total_volume: String,
}

impl AssetRow {
    /// Project one asset record from the snapshot.
    ///
    /// All six fields are mandatory. A record missing any of them aborts
    /// the whole transform; rows are never skipped or defaulted.
    ///
    /// # Arguments
    /// * `index` - position of the record in the snapshot, for error context
    /// * `record` - the open-ended asset object
    ///
    /// # Errors
    /// Returns a missing-field error naming the first absent field.
    pub fn project(index: usize, record: &Value) -> Result<Self> {
        let field = |name: &'static str| -> Result<String> {
            record
                .get(name)
                .map(render)
                .ok_or(PipelineError::MissingField { index, field: name })
        };

        Ok(Self {
            id: field("id")?,
            symbol: field("symbol")?,
            name: field("name")?,
            current_price: field("current_price")?,
            market_cap: field("market_cap")?,
            total_volume: field("total_volume")?,
        })
    }

    /// Fields in header order, for the CSV writer.
    pub fn fields(&self) -> [&str; 6] {
        [
            &self.id,
            &self.symbol,
            &self.name,
            &self.current_price,
            &self.market_cap,
            &self.total_volume,
        ]
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bitcoin() -> Value {
        json!({
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "current_price": 60000,
            "market_cap": 1.1e12,
            "total_volume": 3e10,
            "ath": 69000,
            "last_updated": "2024-10-16T00:00:00Z"
        })
    }

    #[test]
    fn test_project_ignores_extra_fields() {
        let row = AssetRow::project(0, &bitcoin()).unwrap();
        assert_eq!(row.id, "bitcoin");
        assert_eq!(row.symbol, "btc");
        assert_eq!(row.name, "Bitcoin");
        assert_eq!(row.current_price, "60000");
    }

    #[test]
    fn test_number_rendering_is_canonical() {
        let row = AssetRow::project(0, &bitcoin()).unwrap();
        // serde_json's shortest round-trip form for f64 values
        assert_eq!(row.market_cap, "1100000000000.0");
        assert_eq!(row.total_volume, "30000000000.0");
    }

    #[test]
    fn test_null_renders_empty() {
        let mut record = bitcoin();
        record["market_cap"] = Value::Null;
        let row = AssetRow::project(0, &record).unwrap();
        assert_eq!(row.market_cap, "");
    }

    #[test]
    fn test_missing_field_aborts() {
        for name in CSV_HEADER {
            let mut record = bitcoin();
            record.as_object_mut().unwrap().remove(name);

            let err = AssetRow::project(3, &record).unwrap_err();
            match err {
                PipelineError::MissingField { index, field } => {
                    assert_eq!(index, 3);
                    assert_eq!(field, name);
                }
                other => panic!("expected MissingField, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_non_object_record_reports_missing_id() {
        let err = AssetRow::project(0, &json!("not an object")).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingField { field: "id", .. }
        ));
    }

    #[test]
    fn test_fields_follow_header_order() {
        let row = AssetRow::project(0, &bitcoin()).unwrap();
        let fields = row.fields();
        assert_eq!(fields.len(), CSV_HEADER.len());
        assert_eq!(fields[0], "bitcoin");
        assert_eq!(fields[5], "30000000000.0");
    }
}
