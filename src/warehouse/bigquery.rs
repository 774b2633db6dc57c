//! BigQuery load-job client
//!
//! Submits a `configuration.load` job over the BigQuery v2 REST API and
//! polls it to completion. Credentials are ambient, as with the object
//! store: an OAuth2 bearer token provisioned by the platform.

use super::{LoadRequest, Warehouse};
use crate::error::{PipelineError, Result};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use url::Url;

pub const DEFAULT_BIGQUERY_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Warehouse client backed by the BigQuery v2 jobs API.
#[derive(Clone, Debug)]
pub struct BigQueryClient {
    client: Client,
    url: Url,
    poll_interval: Duration,
}

impl BigQueryClient {
    /// Create a client against the given API base URL.
    ///
    /// # Arguments
    /// * `url` - API base, normally [`DEFAULT_BIGQUERY_URL`]; overridable for tests
    /// * `token` - ambient OAuth2 bearer token, if one is provisioned
    ///
    /// # Errors
    /// Returns a configuration error if the token is not a valid header
    /// value or the HTTP client cannot be built.
    pub fn try_new(url: Url, token: Option<&str>) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = token {
            let mut value: reqwest::header::HeaderValue = format!("Bearer {token}")
                .parse()
                .map_err(|_| {
                    PipelineError::Config(
                        "GOOGLE_ACCESS_TOKEN is not a valid header value".to_string(),
                    )
                })?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url,
            poll_interval: POLL_INTERVAL,
        })
    }

    /// Override the job polling interval (tests use zero).
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn jobs_url(&self, project: &str, job_id: Option<&str>) -> Result<Url> {
        let mut url = self.url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| {
                    PipelineError::Config("BigQuery base URL cannot be a base".to_string())
                })?;
            segments.pop_if_empty().extend(["projects", project, "jobs"]);
            if let Some(job_id) = job_id {
                segments.push(job_id);
            }
        }
        Ok(url)
    }

    async fn insert_job(&self, request: &LoadRequest) -> Result<Value> {
        let url = self.jobs_url(&request.table.project, None)?;
        let body = json!({
            "configuration": {
                "load": {
                    "sourceUris": [request.source_uri],
                    "destinationTable": {
                        "projectId": request.table.project,
                        "datasetId": request.table.dataset,
                        "tableId": request.table.table,
                    },
                    "sourceFormat": "CSV",
                    "skipLeadingRows": request.skip_leading_rows,
                    "autodetect": request.autodetect,
                    "writeDisposition": request.write_disposition.as_str(),
                }
            }
        });

        log::debug!(
            "Submitting load job: {} -> {} ({})",
            request.source_uri,
            request.table,
            request.write_disposition.as_str()
        );

        self.request_job(|client| client.post(url).json(&body), request)
            .await
    }

    async fn get_job(&self, request: &LoadRequest, job_id: &str, location: Option<&str>) -> Result<Value> {
        let mut url = self.jobs_url(&request.table.project, Some(job_id))?;
        if let Some(location) = location {
            url.query_pairs_mut().append_pair("location", location);
        }

        self.request_job(|client| client.get(url), request).await
    }

    async fn request_job(
        &self,
        build: impl FnOnce(&Client) -> reqwest::RequestBuilder,
        request: &LoadRequest,
    ) -> Result<Value> {
        let load_err = |reason: String| PipelineError::WarehouseLoad {
            table: request.table.to_string(),
            reason,
        };

        let response = build(&self.client)
            .send()
            .await
            .map_err(|e| load_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(load_err(format!("HTTP {status}: {body}")));
        }

        let job: Value = response
            .json()
            .await
            .map_err(|e| load_err(format!("invalid job response: {e}")))?;
        Ok(job)
    }

    /// Wait until the job reaches DONE, then surface its terminal error if any.
    async fn wait_for_job(&self, request: &LoadRequest, mut job: Value) -> Result<()> {
        let load_err = |reason: String| PipelineError::WarehouseLoad {
            table: request.table.to_string(),
            reason,
        };

        loop {
            if job_state(&job) == Some("DONE") {
                return match job_error(&job) {
                    Some(reason) => Err(load_err(reason)),
                    None => Ok(()),
                };
            }

            let job_id = job
                .pointer("/jobReference/jobId")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    load_err("load job response missing jobReference.jobId".to_string())
                })?
                .to_string();
            let location = job
                .pointer("/jobReference/location")
                .and_then(Value::as_str)
                .map(str::to_string);

            log::debug!(
                "Load job {} is {}, polling...",
                job_id,
                job_state(&job).unwrap_or("in an unknown state")
            );
            tokio::time::sleep(self.poll_interval).await;

            job = self.get_job(request, &job_id, location.as_deref()).await?;
        }
    }
}

fn job_state(job: &Value) -> Option<&str> {
    job.pointer("/status/state").and_then(Value::as_str)
}

fn job_error(job: &Value) -> Option<String> {
    let error = job.pointer("/status/errorResult")?;
    Some(
        error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
    )
}

impl Warehouse for BigQueryClient {
    async fn load_table(&self, request: &LoadRequest) -> Result<()> {
        let job = self.insert_job(request).await?;
        self.wait_for_job(request, job).await?;

        log::info!(
            "Load job complete: {} now reflects {}",
            request.table,
            request.source_uri
        );
        Ok(())
    }
}
