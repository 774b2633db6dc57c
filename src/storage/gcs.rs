//! Google Cloud Storage backend
//!
//! Uses the GCS JSON API directly over HTTP. Credentials are ambient: a
//! bearer token minted by the platform (metadata server, `gcloud auth
//! print-access-token`, workload identity) is read from the environment by
//! the CLI layer and passed in here.

use super::ObjectStore;
use crate::error::{PipelineError, Result};
use reqwest::Client;
use url::Url;

pub const DEFAULT_GCS_URL: &str = "https://storage.googleapis.com";

/// Object store backed by the GCS JSON API.
#[derive(Clone, Debug)]
pub struct GcsStore {
    client: Client,
    url: Url,
}

impl GcsStore {
    /// Create a store against the given API base URL.
    ///
    /// # Arguments
    /// * `url` - API base, normally [`DEFAULT_GCS_URL`]; overridable for tests
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

        Ok(Self { client, url })
    }

    /// Media-download URL: GET {base}/storage/v1/b/{bucket}/o/{key}?alt=media
    fn download_url(&self, bucket: &str, key: &str) -> Result<Url> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| PipelineError::Config("GCS base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["storage", "v1", "b", bucket, "o", key]);
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }

    /// Media-upload URL: POST {base}/upload/storage/v1/b/{bucket}/o?uploadType=media&name={key}
    fn upload_url(&self, bucket: &str, key: &str) -> Result<Url> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| PipelineError::Config("GCS base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["upload", "storage", "v1", "b", bucket, "o"]);
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", key);
        Ok(url)
    }
}

impl ObjectStore for GcsStore {
    async fn download(&self, bucket: &str, key: &str) -> Result<String> {
        let url = self.download_url(bucket, key)?;

        log::debug!("Downloading gs://{}/{}", bucket, key);

        let read_err = |reason: String| PipelineError::StorageRead {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| read_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(read_err(format!("HTTP {status}: {body}")));
        }

        response.text().await.map_err(|e| read_err(e.to_string()))
    }

    async fn upload(&self, bucket: &str, key: &str, content_type: &str, body: String) -> Result<()> {
        let url = self.upload_url(bucket, key)?;

        log::debug!("Uploading {} byte(s) to gs://{}/{}", body.len(), bucket, key);

        let write_err = |reason: String| PipelineError::StorageWrite {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason,
        };

        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type.to_string())
            .body(body)
            .send()
            .await
            .map_err(|e| write_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(write_err(format!("HTTP {status}: {body}")));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn store_for(server: &MockServer, token: Option<&str>) -> GcsStore {
        let url = Url::parse(&server.uri()).unwrap();
        GcsStore::try_new(url, token).unwrap()
    }

    #[tokio::test]
    async fn test_download_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/storage/v1/b/crypto-raw/o/raw_data.json"))
            .and(query_param("alt", "media"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"id":"bitcoin"}]"#))
            .mount(&server)
            .await;

        let store = store_for(&server, None).await;
        let body = store.download("crypto-raw", "raw_data.json").await.unwrap();
        assert_eq!(body, r#"[{"id":"bitcoin"}]"#);
    }

    #[tokio::test]
    async fn test_download_missing_object() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("No such object"))
            .mount(&server)
            .await;

        let store = store_for(&server, None).await;
        let err = store.download("crypto-raw", "raw_data.json").await.unwrap_err();
        match err {
            PipelineError::StorageRead { bucket, key, reason } => {
                assert_eq!(bucket, "crypto-raw");
                assert_eq!(key, "raw_data.json");
                assert!(reason.contains("404"));
            }
            other => panic!("expected StorageRead, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upload_sends_media_and_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/upload/storage/v1/b/crypto-transformed/o"))
            .and(query_param("uploadType", "media"))
            .and(query_param("name", "coingecko/transformed_data.csv"))
            .and(header("content-type", "text/csv"))
            .and(header("authorization", "Bearer ambient-token"))
            .and(body_string("id,symbol\nbitcoin,btc\n"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "ok"})))
            .mount(&server)
            .await;

        let store = store_for(&server, Some("ambient-token")).await;
        store
            .upload(
                "crypto-transformed",
                "coingecko/transformed_data.csv",
                "text/csv",
                "id,symbol\nbitcoin,btc\n".to_string(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upload_failure_is_storage_write() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let store = store_for(&server, None).await;
        let err = store
            .upload("crypto-transformed", "x.csv", "text/csv", "body".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::StorageWrite { .. }));
    }
}
