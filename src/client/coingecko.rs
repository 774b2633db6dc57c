//! CoinGecko REST API client
//!
//! Fetches market snapshots via GET /coins/markets.

use super::Auth;
use crate::error::{PipelineError, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use url::Url;

/// Query parameters for the /coins/markets endpoint.
///
/// The defaults pin the snapshot shape: top 100 assets by market cap, quoted
/// in USD, first page only, no sparkline series. There is no pagination past
/// page 1; the snapshot only ever reflects the top of the market.
#[derive(Clone, Debug, Serialize)]
pub struct MarketsQuery {
    pub vs_currency: String,
    pub order: String,
    pub per_page: u32,
    pub page: u32,
    pub sparkline: bool,
}

impl Default for MarketsQuery {
    fn default() -> Self {
        Self {
            vs_currency: "usd".to_string(),
            order: "market_cap_desc".to_string(),
            per_page: 100,
            page: 1,
            sparkline: false,
        }
    }
}

/// Source of market snapshots.
///
/// The fetch step is written against this seam so tests can substitute a
/// canned source for the remote API.
pub trait MarketSource: Send + Sync {
    /// Fetch one bounded page of market data as parsed JSON.
    ///
    /// # Errors
    /// Returns an error on transport failure, a non-success HTTP status, or
    /// a response body that is not valid JSON.
    fn fetch_markets(&self) -> impl std::future::Future<Output = Result<Value>> + Send;
}

/// CoinGecko API client.
///
/// # Example
/// ```no_run
/// use coingecko_pipeline::client::{Auth, CoinGeckoClient, MarketSource};
/// use url::Url;
///
/// # async fn example() -> coingecko_pipeline::error::Result<()> {
/// let url = Url::parse("https://api.coingecko.com/api/v3").unwrap();
/// let client = CoinGeckoClient::try_new(url, Auth::None)?;
/// let snapshot = client.fetch_markets().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct CoinGeckoClient {
    client: Client,
    url: Url,
    query: MarketsQuery,
}

impl CoinGeckoClient {
    /// Create a new client from a base URL and auth.
    ///
    /// # Errors
    /// Returns a configuration error if the API key is not a valid header
    /// value or the HTTP client cannot be built.
    pub fn try_new(url: Url, auth: Auth) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Auth::ApiKey(key) = &auth {
            let mut value: reqwest::header::HeaderValue = key.parse().map_err(|_| {
                PipelineError::Config("COINGECKO_API_KEY is not a valid header value".to_string())
            })?;
            value.set_sensitive(true);
            headers.insert("x-cg-demo-api-key", value);
        }
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url,
            query: MarketsQuery::default(),
        })
    }

    /// Override the default markets query.
    pub fn with_query(mut self, query: MarketsQuery) -> Self {
        self.query = query;
        self
    }

    fn markets_url(&self) -> Result<Url> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| PipelineError::Config("API base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["coins", "markets"]);
        Ok(url)
    }

    async fn request_markets(&self) -> Result<Value> {
        let url = self.markets_url()?;
        let endpoint = url.to_string();

        log::debug!(
            "GET {} (vs_currency={}, per_page={})",
            endpoint,
            self.query.vs_currency,
            self.query.per_page
        );

        let response = self
            .client
            .get(url)
            .query(&self.query)
            .send()
            .await
            .map_err(|source| PipelineError::Network {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::HttpStatus {
                endpoint,
                status,
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| PipelineError::Network { endpoint, source })?;

        let snapshot: Value = serde_json::from_str(&body)?;
        Ok(snapshot)
    }
}

impl MarketSource for CoinGeckoClient {
    async fn fetch_markets(&self) -> Result<Value> {
        let snapshot = self.request_markets().await?;

        if let Some(records) = snapshot.as_array() {
            log::info!("Fetched {} asset record(s)", records.len());
        }

        Ok(snapshot)
    }
}
