//! CLI helper functions
//!
//! Wires configuration, clients, and steps together. A scheduler drives
//! the individual step commands (Airflow task, cron line, Cloud Scheduler
//! job); `run_pipeline` executes all three in sequence with an explicit
//! retry policy for standalone use.

use crate::client::{Auth, CoinGeckoClient};
use crate::config::PipelineConfig;
use crate::etl::{Fetcher, Loader, Pipeline, RetryPolicy, Step, Transformer};
use crate::storage::{DEFAULT_GCS_URL, GcsStore};
use crate::warehouse::{BigQueryClient, DEFAULT_BIGQUERY_URL, LoadRequest};
use eyre::{Context, Result};
use owo_colors::OwoColorize;
use url::Url;

/// Resolve the pipeline configuration from the environment.
pub fn load_config() -> Result<PipelineConfig> {
    let config = PipelineConfig::from_env().context("Failed to load pipeline configuration")?;
    log::debug!(
        "Configured: {} -> {} -> {}",
        config.raw_uri(),
        config.transformed_uri(),
        config.table_id
    );
    Ok(config)
}

/// Ambient platform credential for storage and warehouse access.
///
/// `GOOGLE_ACCESS_TOKEN` holds an OAuth2 bearer token minted outside this
/// pipeline (metadata server, `gcloud auth print-access-token`, workload
/// identity). Absence is tolerated here; unauthenticated requests fail at
/// the service instead.
fn ambient_token() -> Option<String> {
    std::env::var("GOOGLE_ACCESS_TOKEN").ok()
}

fn service_url(var: &str, default: &str) -> Result<Url> {
    let url = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&url).with_context(|| format!("Invalid {var}: {url}"))
}

/// Build the CoinGecko client from configuration.
pub fn load_market_client(config: &PipelineConfig) -> Result<CoinGeckoClient> {
    let auth = Auth::from_api_key(config.api_key.clone());
    log::debug!("CoinGecko auth: {}", auth);
    CoinGeckoClient::try_new(config.api_url.clone(), auth)
        .context("Failed to create CoinGecko client")
}

/// Build the GCS store. `GCS_URL` overrides the endpoint for emulators.
pub fn load_object_store() -> Result<GcsStore> {
    let url = service_url("GCS_URL", DEFAULT_GCS_URL)?;
    GcsStore::try_new(url, ambient_token().as_deref()).context("Failed to create GCS client")
}

/// Build the BigQuery client. `BIGQUERY_URL` overrides the endpoint.
pub fn load_warehouse_client() -> Result<BigQueryClient> {
    let url = service_url("BIGQUERY_URL", DEFAULT_BIGQUERY_URL)?;
    BigQueryClient::try_new(url, ambient_token().as_deref())
        .context("Failed to create BigQuery client")
}

fn build_fetcher(config: &PipelineConfig) -> Result<Fetcher<CoinGeckoClient, GcsStore>> {
    Ok(Fetcher::new(
        load_market_client(config)?,
        load_object_store()?,
        config.source_bucket.clone(),
        config.raw_key.clone(),
    ))
}

fn build_transformer(config: &PipelineConfig) -> Result<Transformer<GcsStore>> {
    Ok(Transformer::new(
        load_object_store()?,
        config.source_bucket.clone(),
        config.raw_key.clone(),
        config.staging_bucket.clone(),
        config.transformed_key.clone(),
    ))
}

fn build_loader(config: &PipelineConfig) -> Result<Loader<BigQueryClient>> {
    let request = LoadRequest::new(config.transformed_uri(), config.table_id.clone());
    Ok(Loader::new(load_warehouse_client()?, request))
}

/// Run the fetch step once (retry is the scheduler's job).
pub async fn run_fetch() -> Result<()> {
    let config = load_config()?;
    log::info!("Fetching snapshot to {}", config.raw_uri().bright_black());
    build_fetcher(&config)?.run().await?;
    Ok(())
}

/// Run the transform step once.
pub async fn run_transform() -> Result<()> {
    let config = load_config()?;
    log::info!(
        "Transforming {} to {}",
        config.raw_uri().bright_black(),
        config.transformed_uri().bright_black()
    );
    build_transformer(&config)?.run().await?;
    Ok(())
}

/// Run the load step once.
pub async fn run_load() -> Result<()> {
    let config = load_config()?;
    log::info!(
        "Loading {} into {}",
        config.transformed_uri().bright_black(),
        config.table_id.to_string().bright_black()
    );
    build_loader(&config)?.run().await?;
    Ok(())
}

/// Run the full fetch → transform → load pipeline under the given retry
/// policy.
pub async fn run_pipeline(retry: RetryPolicy) -> Result<()> {
    let config = load_config()?;
    log::info!(
        "Pipeline: {} -> {} -> {}",
        config.raw_uri().bright_black(),
        config.transformed_uri().bright_black(),
        config.table_id.to_string().bright_black()
    );

    let pipeline = Pipeline::new(
        build_fetcher(&config)?,
        build_transformer(&config)?,
        build_loader(&config)?,
    )
    .with_retry_policy(retry);

    pipeline.run().await?;
    Ok(())
}
