use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use garde::Validate;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::info;

use crate::config::ClientConfig;
use crate::events::JobEvent;
use crate::models::job::Job;
use crate::models::params::BlurParams;
use crate::models::upload::UploadFile;
use crate::services::api::{ApiClient, ApiError, ServiceHealth};
use crate::services::poller::Poller;
use crate::services::registry::JobRegistry;
use crate::services::validation::{self, ValidationError};

/// Errors surfaced by session operations. Nothing is retried automatically;
/// every variant is reported to the caller, who may retry manually.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invalid parameters: {0}")]
    InvalidParams(garde::Report),

    #[error("submission failed: {0}")]
    Submission(ApiError),

    #[error("status check failed: {0}")]
    PollingTransport(ApiError),

    #[error("result download failed: {0}")]
    Retrieval(ApiError),

    #[error("delete failed: {0}")]
    Delete(ApiError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One independent client session: configuration, API client, job registry,
/// and the per-job poll loops, held together as explicit state instead of
/// globals. Multiple sessions can coexist in one process.
pub struct Session {
    config: ClientConfig,
    api: Arc<ApiClient>,
    registry: Arc<Mutex<JobRegistry>>,
    poller: Poller,
    events: UnboundedSender<JobEvent>,
}

impl Session {
    /// Build a session and the receiving end of its event stream.
    pub fn new(config: ClientConfig) -> (Self, UnboundedReceiver<JobEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let api = Arc::new(ApiClient::new(&config.api_base_url));
        let registry = Arc::new(Mutex::new(JobRegistry::new()));
        let poller = Poller::new(
            Arc::clone(&api),
            Arc::clone(&registry),
            events.clone(),
            Duration::from_millis(config.poll_interval_ms),
        );

        let session = Self {
            config,
            api,
            registry,
            poller,
            events,
        };
        (session, receiver)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Validate and submit a file for redaction.
    ///
    /// Runs the client-side checks (parameter validation, accepted format,
    /// size ceiling) before any network call, uploads the file, and records
    /// the returned job in the registry. Polling is not started here;
    /// callers normally call [`Session::start_polling`] right after.
    pub async fn submit(
        &self,
        file: &UploadFile,
        params: &BlurParams,
    ) -> Result<Job, SessionError> {
        params.validate().map_err(SessionError::InvalidParams)?;
        validation::check_upload(file, &self.config)?;

        let job = self
            .api
            .submit_blur_job(file, params)
            .await
            .map_err(SessionError::Submission)?;

        info!(job_id = %job.id, status = %job.status, "Job submitted");

        self.registry
            .lock()
            .expect("job registry poisoned")
            .upsert(job.clone());
        let _ = self.events.send(JobEvent::Upserted(job.clone()));

        Ok(job)
    }

    /// Begin polling a job. No-op (returns `false`) when a loop is already
    /// active for this identifier.
    pub fn start_polling(&self, job_id: &str) -> bool {
        self.poller.start(job_id)
    }

    /// Stop polling a job without touching the registry.
    pub fn stop_polling(&self, job_id: &str) -> bool {
        self.poller.stop(job_id)
    }

    pub fn is_polling(&self, job_id: &str) -> bool {
        self.poller.is_active(job_id)
    }

    pub fn active_poll_count(&self) -> usize {
        self.poller.active_count()
    }

    /// Fetch one fresh snapshot outside any poll loop and record it.
    pub async fn refresh_job(&self, job_id: &str) -> Result<Job, SessionError> {
        let job = self
            .api
            .fetch_job(job_id)
            .await
            .map_err(SessionError::PollingTransport)?;

        self.registry
            .lock()
            .expect("job registry poisoned")
            .upsert(job.clone());
        let _ = self.events.send(JobEvent::Upserted(job.clone()));

        Ok(job)
    }

    /// Download the finished artifact of a completed job.
    ///
    /// A failed download is reported as [`SessionError::Retrieval`] and
    /// never mutates the registry entry: the job remains completed, only
    /// the download attempt failed.
    pub async fn download_result(&self, job_id: &str) -> Result<Vec<u8>, SessionError> {
        self.api
            .fetch_result(job_id)
            .await
            .map_err(SessionError::Retrieval)
    }

    /// Download the finished artifact and write it to `path`.
    pub async fn save_result(&self, job_id: &str, path: &Path) -> Result<u64, SessionError> {
        let bytes = self.download_result(job_id).await?;
        tokio::fs::write(path, &bytes).await?;
        info!(job_id = %job_id, path = %path.display(), size = bytes.len(), "Result saved");
        Ok(bytes.len() as u64)
    }

    /// Filename offered for a saved result when the caller gives none.
    pub fn suggested_output_name(job: &Job) -> String {
        match &job.input_file {
            Some(name) => format!("blurred_{name}"),
            None => format!("blurred_video_{}.mp4", job.id),
        }
    }

    /// Delete or cancel a job: stops its poll loop, removes it from the
    /// backend and the registry, and emits [`JobEvent::Removed`].
    pub async fn delete_job(&self, job_id: &str) -> Result<(), SessionError> {
        self.poller.stop(job_id);

        self.api
            .delete_job(job_id)
            .await
            .map_err(SessionError::Delete)?;

        let removed = self
            .registry
            .lock()
            .expect("job registry poisoned")
            .remove(job_id);
        if removed.is_some() {
            let _ = self.events.send(JobEvent::Removed {
                job_id: job_id.to_string(),
            });
        }

        info!(job_id = %job_id, "Job deleted");
        Ok(())
    }

    /// Snapshot of a single registry entry.
    pub fn get_job(&self, job_id: &str) -> Option<Job> {
        self.registry
            .lock()
            .expect("job registry poisoned")
            .get(job_id)
            .cloned()
    }

    /// All known jobs, newest first.
    pub fn jobs(&self) -> Vec<Job> {
        self.registry
            .lock()
            .expect("job registry poisoned")
            .jobs()
            .to_vec()
    }

    /// (active, terminal) views of the registry.
    pub fn partition(&self) -> (Vec<Job>, Vec<Job>) {
        self.registry
            .lock()
            .expect("job registry poisoned")
            .partition()
    }

    pub fn job_count(&self) -> usize {
        self.registry.lock().expect("job registry poisoned").len()
    }

    /// Backend availability check; never used by the poll loops.
    pub async fn health(&self) -> Result<ServiceHealth, ApiError> {
        self.api.health().await
    }
}
