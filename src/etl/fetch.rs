//! Fetch step
//!
//! Pulls one market snapshot from the source API and stages it, verbatim,
//! as a JSON object at the fixed raw key.

use super::Step;
use crate::client::MarketSource;
use crate::error::Result;
use crate::storage::ObjectStore;

/// Stages the raw market snapshot.
///
/// The upload happens only after a successfully parsed response, so a
/// failed fetch leaves the previous run's object in place at the raw key.
pub struct Fetcher<M, S> {
    source: M,
    store: S,
    bucket: String,
    key: String,
}

impl<M, S> Fetcher<M, S>
where
    M: MarketSource,
    S: ObjectStore,
{
    /// # Arguments
    /// * `source` - market data source (the CoinGecko client in production)
    /// * `store` - staging object store
    /// * `bucket` / `key` - fixed location of the raw snapshot object
    pub fn new(source: M, store: S, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            source,
            store,
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    async fn fetch(&self) -> Result<()> {
        let snapshot = self.source.fetch_markets().await?;

        let body = serde_json::to_string(&snapshot)?;
        self.store
            .upload(&self.bucket, &self.key, "application/json", body)
            .await?;

        log::info!("Staged raw snapshot at gs://{}/{}", self.bucket, self.key);
        Ok(())
    }
}

impl<M, S> Step for Fetcher<M, S>
where
    M: MarketSource,
    S: ObjectStore,
{
    fn name(&self) -> &'static str {
        "fetch"
    }

    async fn run(&self) -> Result<()> {
        self.fetch().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::storage::LocalStore;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    struct CannedSource(Value);

    impl MarketSource for CannedSource {
        async fn fetch_markets(&self) -> Result<Value> {
            Ok(self.0.clone())
        }
    }

    struct UnavailableSource;

    impl MarketSource for UnavailableSource {
        async fn fetch_markets(&self) -> Result<Value> {
            Err(PipelineError::HttpStatus {
                endpoint: "https://api.coingecko.com/api/v3/coins/markets".to_string(),
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: "server error".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_fetch_stages_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalStore::new(temp_dir.path());
        let snapshot = json!([{"id": "bitcoin", "symbol": "btc"}]);

        let fetcher = Fetcher::new(
            CannedSource(snapshot.clone()),
            store.clone(),
            "crypto-raw",
            "coingecko/raw_data.json",
        );
        fetcher.run().await.unwrap();

        let staged = store
            .download("crypto-raw", "coingecko/raw_data.json")
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&staged).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[tokio::test]
    async fn test_failed_fetch_preserves_previous_object() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalStore::new(temp_dir.path());

        store
            .upload(
                "crypto-raw",
                "coingecko/raw_data.json",
                "application/json",
                r#"[{"id":"from-last-run"}]"#.to_string(),
            )
            .await
            .unwrap();

        let fetcher = Fetcher::new(
            UnavailableSource,
            store.clone(),
            "crypto-raw",
            "coingecko/raw_data.json",
        );
        let err = fetcher.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::HttpStatus { .. }));

        let staged = store
            .download("crypto-raw", "coingecko/raw_data.json")
            .await
            .unwrap();
        assert_eq!(staged, r#"[{"id":"from-last-run"}]"#);
    }
}
