use crate::models::job::Job;

/// State-change notifications emitted by the session and its poll loops.
///
/// Presentation layers (CLI, UI) consume these; the core never renders
/// anything itself.
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// A fresh snapshot was written into the registry.
    Upserted(Job),
    /// A job was explicitly deleted or cancelled.
    Removed { job_id: String },
    /// The job reached `completed`; its result can now be downloaded.
    Completed(Job),
    /// The job reached `failed`; the snapshot carries the backend error.
    Failed(Job),
    /// A status poll failed in transit and the loop gave up. The registry
    /// keeps the last known non-terminal snapshot.
    PollingLost { job_id: String, error: String },
}

impl JobEvent {
    /// Identifier of the job this event concerns.
    pub fn job_id(&self) -> &str {
        match self {
            JobEvent::Upserted(job) | JobEvent::Completed(job) | JobEvent::Failed(job) => &job.id,
            JobEvent::Removed { job_id } | JobEvent::PollingLost { job_id, .. } => job_id,
        }
    }
}
