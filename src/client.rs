//! Conversion API client.
//!
//! [`ConversionApi`] is the seam between the share pipeline and the external
//! service: the coordinator only ever talks to `Arc<dyn ConversionApi>`, so
//! tests and alternative transports plug in without touching polling logic.
//! [`HttpConversionClient`] is the production implementation over reqwest.
//!
//! ## Wire contract
//!
//! ```text
//! POST /conversions        {inputFile:{name,format}, outputFile:{format}}
//!                          → 202 ConversionJob | non-2xx {message}
//! GET  /conversions/{id}   → 200 ConversionJob | 404 {message}
//! ```

use crate::config::ShareConfig;
use crate::error::{ApiError, ShareError};
use crate::model::{ConversionJob, CreateConversionRequest};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Operations the share pipeline needs from the Conversion API.
#[async_trait]
pub trait ConversionApi: Send + Sync {
    /// Submit a new conversion job.
    async fn create_conversion(
        &self,
        request: &CreateConversionRequest,
    ) -> Result<ConversionJob, ApiError>;

    /// Fetch the current state of a job.
    async fn get_conversion(&self, id: &str) -> Result<ConversionJob, ApiError>;
}

/// `{ "message": ... }` error body returned by the Conversion API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// reqwest-backed [`ConversionApi`].
#[derive(Debug, Clone)]
pub struct HttpConversionClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpConversionClient {
    /// Build a client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ShareError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ShareError::InvalidConfig(format!("HTTP client: {e}")))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| ShareError::InvalidConfig(format!("Conversion API URL '{base_url}': {e}")))?;
        Ok(Self { base_url, http })
    }

    pub fn from_config(config: &ShareConfig) -> Result<Self, ShareError> {
        Self::new(
            config.conversion_api_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn conversions_url(&self) -> String {
        format!("{}/conversions", self.base_url)
    }

    /// `{base}/conversions/{id}` with `id` escaped as a single path segment.
    fn conversion_url(&self, id: &str) -> Result<reqwest::Url, ApiError> {
        let mut url = reqwest::Url::parse(&self.conversions_url()).map_err(|e| {
            ApiError::Transport {
                reason: format!("invalid Conversion API URL: {e}"),
            }
        })?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport {
                reason: format!("Conversion API URL cannot take a path: {}", self.base_url),
            })?
            .push(id);
        Ok(url)
    }

    /// Turn a response into a job, or into the matching [`ApiError`].
    async fn read_job(response: reqwest::Response) -> Result<ConversionJob, ApiError> {
        let status = response.status();
        let bytes = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: parse_error_message(&bytes),
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| ApiError::MalformedJob {
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl ConversionApi for HttpConversionClient {
    async fn create_conversion(
        &self,
        request: &CreateConversionRequest,
    ) -> Result<ConversionJob, ApiError> {
        let url = self.conversions_url();
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        Self::read_job(response).await
    }

    async fn get_conversion(&self, id: &str) -> Result<ConversionJob, ApiError> {
        let url = self.conversion_url(id)?;
        debug!("GET {}", url);

        let response = self.http.get(url).send().await.map_err(transport_error)?;

        Self::read_job(response).await
    }
}

fn transport_error(e: reqwest::Error) -> ApiError {
    let reason = if e.is_timeout() {
        format!("timed out: {e}")
    } else {
        e.to_string()
    };
    ApiError::Transport { reason }
}

/// Extract `message` from an error body; non-JSON bodies yield `None`.
fn parse_error_message(bytes: &[u8]) -> Option<String> {
    serde_json::from_slice::<ApiErrorBody>(bytes)
        .ok()
        .and_then(|b| b.message)
}
