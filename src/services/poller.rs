use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::events::JobEvent;
use crate::models::job::JobStatus;
use crate::services::api::ApiClient;
use crate::services::registry::JobRegistry;

/// Drives one self-rescheduling poll loop per tracked job.
///
/// Each loop fetches the job snapshot, writes it into the registry, and
/// either reschedules itself after a fixed delay or stops on a terminal
/// state. Ticks for one job are strictly sequential: the next is scheduled
/// only after the previous response has been processed. Loops for distinct
/// jobs run as independent tasks.
///
/// Each started loop carries a generation token and exits as soon as the
/// active entry for its id no longer holds that token. A stop-then-restart
/// therefore can never resurrect the predecessor loop: the restart installs
/// a new generation and the old loop retires when its in-flight tick
/// resolves.
pub struct Poller {
    api: Arc<ApiClient>,
    registry: Arc<Mutex<JobRegistry>>,
    active: Arc<Mutex<HashMap<String, u64>>>,
    next_generation: AtomicU64,
    events: UnboundedSender<JobEvent>,
    interval: Duration,
}

impl Poller {
    pub fn new(
        api: Arc<ApiClient>,
        registry: Arc<Mutex<JobRegistry>>,
        events: UnboundedSender<JobEvent>,
        interval: Duration,
    ) -> Self {
        Self {
            api,
            registry,
            active: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
            events,
            interval,
        }
    }

    /// Start a poll loop for `job_id`. Idempotent: returns `false` without
    /// spawning anything if a loop is already active for that identifier.
    pub fn start(&self, job_id: &str) -> bool {
        let generation = {
            let mut active = self.active.lock().expect("active poll set poisoned");
            if active.contains_key(job_id) {
                debug!(job_id = %job_id, "Poll loop already active, ignoring start");
                return false;
            }
            let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
            active.insert(job_id.to_string(), generation);
            generation
        };

        info!(job_id = %job_id, interval_ms = self.interval.as_millis() as u64, "Starting poll loop");

        let api = Arc::clone(&self.api);
        let registry = Arc::clone(&self.registry);
        let active = Arc::clone(&self.active);
        let events = self.events.clone();
        let interval = self.interval;
        let job_id = job_id.to_string();

        tokio::spawn(async move {
            poll_loop(api, registry, active, events, interval, job_id, generation).await;
        });

        true
    }

    /// Stop tracking `job_id`. Cooperative: an in-flight request is not
    /// aborted, but its result is discarded and no further tick is
    /// scheduled.
    pub fn stop(&self, job_id: &str) -> bool {
        let removed = self
            .active
            .lock()
            .expect("active poll set poisoned")
            .remove(job_id)
            .is_some();
        if removed {
            info!(job_id = %job_id, "Stopped poll loop");
        }
        removed
    }

    pub fn is_active(&self, job_id: &str) -> bool {
        self.active
            .lock()
            .expect("active poll set poisoned")
            .contains_key(job_id)
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().expect("active poll set poisoned").len()
    }
}

#[allow(clippy::too_many_arguments)]
async fn poll_loop(
    api: Arc<ApiClient>,
    registry: Arc<Mutex<JobRegistry>>,
    active: Arc<Mutex<HashMap<String, u64>>>,
    events: UnboundedSender<JobEvent>,
    interval: Duration,
    job_id: String,
    generation: u64,
) {
    // This loop owns the active entry only while it still holds its own
    // generation token; a stopped or restarted id fails the check.
    let current = |map: &Mutex<HashMap<String, u64>>| {
        map.lock()
            .expect("active poll set poisoned")
            .get(&job_id)
            .is_some_and(|g| *g == generation)
    };

    loop {
        if !current(&active) {
            debug!(job_id = %job_id, "Job no longer tracked, exiting poll loop");
            return;
        }

        let snapshot = match api.fetch_job(&job_id).await {
            Ok(job) => job,
            Err(e) => {
                // One failed tick ends the loop: the job stays in its last
                // known state and the loss is surfaced as an event.
                let was_current = {
                    let mut map = active.lock().expect("active poll set poisoned");
                    if map.get(&job_id) == Some(&generation) {
                        map.remove(&job_id);
                        true
                    } else {
                        false
                    }
                };
                if was_current {
                    warn!(job_id = %job_id, error = %e, "Status poll failed, abandoning loop");
                    let _ = events.send(JobEvent::PollingLost {
                        job_id: job_id.clone(),
                        error: e.to_string(),
                    });
                }
                return;
            }
        };

        // Stopped or restarted while the request was in flight: discard the
        // snapshot, it belongs to a retired loop.
        if !current(&active) {
            debug!(job_id = %job_id, "Loop superseded mid-tick, discarding snapshot");
            return;
        }

        registry
            .lock()
            .expect("job registry poisoned")
            .upsert(snapshot.clone());
        let _ = events.send(JobEvent::Upserted(snapshot.clone()));

        match snapshot.status {
            JobStatus::Queued | JobStatus::Processing => {
                debug!(
                    job_id = %job_id,
                    status = %snapshot.status,
                    progress = snapshot.progress,
                    "Job still active"
                );
                sleep(interval).await;
            }
            JobStatus::Completed => {
                retire(&active, &job_id, generation);
                info!(job_id = %job_id, "Job completed");
                let _ = events.send(JobEvent::Completed(snapshot));
                return;
            }
            JobStatus::Failed => {
                retire(&active, &job_id, generation);
                warn!(
                    job_id = %job_id,
                    error = snapshot.error.as_deref().unwrap_or("unknown"),
                    "Job failed"
                );
                let _ = events.send(JobEvent::Failed(snapshot));
                return;
            }
        }
    }
}

/// Remove the active entry for `job_id`, but only when it still belongs to
/// this loop's generation.
fn retire(active: &Mutex<HashMap<String, u64>>, job_id: &str, generation: u64) {
    let mut map = active.lock().expect("active poll set poisoned");
    if map.get(job_id) == Some(&generation) {
        map.remove(job_id);
    }
}
