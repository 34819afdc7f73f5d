use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::params::BlurParams;

/// Status of a redaction job as reported by the backend.
///
/// The only legal path is `queued → processing → {completed, failed}`;
/// `completed` and `failed` are terminal and are never left again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One backend-tracked unit of asynchronous redaction work.
///
/// A `Job` is a snapshot: polls replace the whole record, never merge into
/// it. The identifier is assigned by the backend at submission time and is
/// treated as opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "job_id")]
    pub id: String,
    pub status: JobStatus,
    /// Percentage 0-100, meaningful only while the job is processing. The
    /// backend is expected to report it non-decreasing but the client does
    /// not rely on that.
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub input_file: Option<String>,
    #[serde(default)]
    pub output_file: Option<String>,
    /// Configuration snapshot echoed back by the backend.
    #[serde(default)]
    pub parameters: Option<BlurParams>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Present only when the job failed.
    #[serde(default)]
    pub error: Option<String>,
}

impl Job {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}
