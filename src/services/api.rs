use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::models::job::Job;
use crate::models::params::BlurParams;
use crate::models::upload::UploadFile;

/// Client for the redaction service's HTTP API.
///
/// Thin wrapper over the wire contract; no retries, no deadlines. Policy
/// (validation, polling, registry bookkeeping) lives in the layers above.
pub struct ApiClient {
    http: Client,
    base_url: String,
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Response from `GET /health`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend rejected the request ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Submit a video for redaction via `POST /videos/blur`.
    ///
    /// Returns the job record the backend assigned, normally in status
    /// `queued`. Does not start polling.
    pub async fn submit_blur_job(
        &self,
        file: &UploadFile,
        params: &BlurParams,
    ) -> Result<Job, ApiError> {
        let mut video = Part::bytes(file.data.clone()).file_name(file.file_name.clone());
        if let Some(content_type) = &file.content_type {
            video = video.mime_str(content_type)?;
        }

        let mut form = Form::new()
            .part("video", video)
            .text("blur_strength", params.blur_strength.to_string())
            .text("confidence", params.confidence.to_string())
            .text("sample_rate", params.sample_rate.to_string())
            .text("padding", params.padding.to_string());
        for language in &params.languages {
            form = form.text("languages", language.clone());
        }
        for word in &params.words {
            form = form.text("words", word.clone());
        }

        debug!(
            file_name = %file.file_name,
            size = file.size(),
            blur_strength = params.blur_strength,
            "Submitting blur job"
        );

        let response = self
            .http
            .post(format!("{}/videos/blur", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        Ok(response.json::<Job>().await?)
    }

    /// Fetch the current snapshot of a job via `GET /jobs/{id}`.
    pub async fn fetch_job(&self, job_id: &str) -> Result<Job, ApiError> {
        let response = self
            .http
            .get(format!("{}/jobs/{}", self.base_url, job_id))
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        Ok(response.json::<Job>().await?)
    }

    /// Download the finished artifact via `GET /jobs/{id}/result`.
    pub async fn fetch_result(&self, job_id: &str) -> Result<Vec<u8>, ApiError> {
        let response = self
            .http
            .get(format!("{}/jobs/{}/result", self.base_url, job_id))
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Remove or cancel a job via `DELETE /jobs/{id}`.
    pub async fn delete_job(&self, job_id: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(format!("{}/jobs/{}", self.base_url, job_id))
            .send()
            .await?;

        Self::check_status(response).await?;
        Ok(())
    }

    /// Check backend availability via `GET /health`.
    pub async fn health(&self) -> Result<ServiceHealth, ApiError> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        Ok(response.json::<ServiceHealth>().await?)
    }

    /// Map a non-2xx response to `ApiError::Rejected`, carrying the
    /// server-provided message when one is present.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.text().await {
            Ok(body) => serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("request failed with status {status}")),
            Err(_) => format!("request failed with status {status}"),
        };

        Err(ApiError::Rejected { status, message })
    }
}
