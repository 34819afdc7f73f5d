use tracing::warn;

use crate::models::job::Job;

/// Outcome of a registry upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

/// Ordered in-memory collection of known jobs for one client session.
///
/// Jobs are keyed by identifier, newest first. Polls supersede the entire
/// record; there are no partial merges and no expiry. Nothing here is
/// persisted.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Vec<Job>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an unseen job at the front, or replace the full snapshot of a
    /// seen one.
    pub fn upsert(&mut self, job: Job) -> Upsert {
        match self.jobs.iter_mut().find(|j| j.id == job.id) {
            Some(existing) => {
                if existing.status.is_terminal() && existing.status != job.status {
                    // No legal transition leaves a terminal state.
                    warn!(
                        job_id = %job.id,
                        from = %existing.status,
                        to = %job.status,
                        "Terminal job snapshot superseded with a different status"
                    );
                }
                *existing = job;
                Upsert::Replaced
            }
            None => {
                self.jobs.insert(0, job);
                Upsert::Inserted
            }
        }
    }

    pub fn remove(&mut self, job_id: &str) -> Option<Job> {
        let index = self.jobs.iter().position(|j| j.id == job_id)?;
        Some(self.jobs.remove(index))
    }

    pub fn get(&self, job_id: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == job_id)
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.get(job_id).is_some()
    }

    /// All known jobs, newest first.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Split into (active, terminal) views, each preserving registry order.
    pub fn partition(&self) -> (Vec<Job>, Vec<Job>) {
        self.jobs.iter().cloned().partition(|j| j.is_active())
    }
}
