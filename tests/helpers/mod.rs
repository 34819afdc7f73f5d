//! In-process stub backend for lifecycle tests.
//!
//! Implements the redaction service's HTTP contract with scripted job
//! progressions: each poll for a scripted job pops the next snapshot, and
//! the final snapshot keeps being served. Knobs exist to delay or fail
//! polls, reject submissions, and capture everything the client sends.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::time::sleep;
use uuid::Uuid;

use vidblur_client::config::ClientConfig;
use vidblur_client::models::job::{Job, JobStatus};

/// Everything the client sent in one multipart submission.
#[derive(Debug, Default, Clone)]
pub struct Submission {
    pub file_name: String,
    pub content_type: Option<String>,
    pub size: usize,
    pub words: Vec<String>,
    pub languages: Vec<String>,
    pub blur_strength: Option<String>,
    pub confidence: Option<String>,
    pub sample_rate: Option<String>,
    pub padding: Option<String>,
}

#[derive(Default)]
pub struct BackendState {
    /// Identifier assigned to the next submission (random when unset).
    pub next_job_id: Mutex<Option<String>>,
    /// Scripted status progressions per job id.
    pub scripts: Mutex<HashMap<String, VecDeque<Job>>>,
    pub poll_counts: Mutex<HashMap<String, usize>>,
    pub submissions: Mutex<Vec<Submission>>,
    pub results: Mutex<HashMap<String, Vec<u8>>>,
    pub deleted: Mutex<Vec<String>>,
    /// Job ids whose status polls answer 500.
    pub fail_polls: Mutex<HashSet<String>>,
    /// Artificial latency per job id, applied before answering a poll.
    pub poll_delay_ms: Mutex<HashMap<String, u64>>,
    /// When set, submissions are rejected with this message.
    pub reject_submissions: Mutex<Option<String>>,
}

pub struct StubBackend {
    pub state: Arc<BackendState>,
    pub base_url: String,
}

impl StubBackend {
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::default());
        let app = router(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind stub backend");
        let addr = listener.local_addr().expect("no local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub backend died");
        });

        Self {
            state,
            base_url: format!("http://{addr}/api/v1"),
        }
    }

    /// Client config pointed at this stub, with a short poll interval so
    /// tests run fast.
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            api_base_url: self.base_url.clone(),
            poll_interval_ms: 25,
            ..ClientConfig::default()
        }
    }

    pub fn set_next_job_id(&self, id: &str) {
        *self.state.next_job_id.lock().unwrap() = Some(id.to_string());
    }

    pub fn script_job(&self, id: &str, snapshots: Vec<Job>) {
        self.state
            .scripts
            .lock()
            .unwrap()
            .insert(id.to_string(), snapshots.into());
    }

    pub fn set_result(&self, id: &str, bytes: Vec<u8>) {
        self.state.results.lock().unwrap().insert(id.to_string(), bytes);
    }

    pub fn fail_polls_for(&self, id: &str) {
        self.state.fail_polls.lock().unwrap().insert(id.to_string());
    }

    pub fn delay_polls_for(&self, id: &str, millis: u64) {
        self.state
            .poll_delay_ms
            .lock()
            .unwrap()
            .insert(id.to_string(), millis);
    }

    pub fn reject_submissions_with(&self, message: &str) {
        *self.state.reject_submissions.lock().unwrap() = Some(message.to_string());
    }

    pub fn poll_count(&self, id: &str) -> usize {
        self.state
            .poll_counts
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .unwrap_or(0)
    }

    pub fn submission_count(&self) -> usize {
        self.state.submissions.lock().unwrap().len()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state.submissions.lock().unwrap().clone()
    }

    pub fn deleted_jobs(&self) -> Vec<String> {
        self.state.deleted.lock().unwrap().clone()
    }
}

/// Build a job snapshot for scripting.
pub fn snapshot(id: &str, status: JobStatus, progress: u8) -> Job {
    Job {
        id: id.to_string(),
        status,
        progress,
        input_file: Some("clip.mp4".to_string()),
        output_file: None,
        parameters: None,
        created_at: None,
        started_at: None,
        completed_at: None,
        error: None,
    }
}

pub fn failed_snapshot(id: &str, error: &str) -> Job {
    Job {
        error: Some(error.to_string()),
        ..snapshot(id, JobStatus::Failed, 0)
    }
}

fn router(state: Arc<BackendState>) -> Router {
    let api = Router::new()
        .route("/videos/blur", post(submit_job))
        .route("/jobs/{id}", get(job_status).delete(delete_job))
        .route("/jobs/{id}/result", get(job_result))
        .route("/health", get(health))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(600 * 1024 * 1024))
}

type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

async fn submit_job(
    State(state): State<Arc<BackendState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<Job>> {
    if let Some(message) = state.reject_submissions.lock().unwrap().clone() {
        return Err((StatusCode::BAD_REQUEST, Json(json!({ "message": message }))));
    }

    let mut submission = Submission::default();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("video") => {
                submission.file_name = field.file_name().unwrap_or_default().to_string();
                submission.content_type = field.content_type().map(|t| t.to_string());
                submission.size = field.bytes().await.unwrap().len();
            }
            Some("words") => submission.words.push(field.text().await.unwrap()),
            Some("languages") => submission.languages.push(field.text().await.unwrap()),
            Some("blur_strength") => submission.blur_strength = Some(field.text().await.unwrap()),
            Some("confidence") => submission.confidence = Some(field.text().await.unwrap()),
            Some("sample_rate") => submission.sample_rate = Some(field.text().await.unwrap()),
            Some("padding") => submission.padding = Some(field.text().await.unwrap()),
            _ => {}
        }
    }

    if submission.file_name.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Video file is required" })),
        ));
    }

    state.submissions.lock().unwrap().push(submission);

    let job_id = state
        .next_job_id
        .lock()
        .unwrap()
        .take()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    Ok(Json(snapshot(&job_id, JobStatus::Queued, 0)))
}

async fn job_status(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Job>> {
    let delay = state.poll_delay_ms.lock().unwrap().get(&id).copied();
    if let Some(millis) = delay {
        sleep(Duration::from_millis(millis)).await;
    }

    *state.poll_counts.lock().unwrap().entry(id.clone()).or_insert(0) += 1;

    if state.fail_polls.lock().unwrap().contains(&id) {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "status backend unavailable" })),
        ));
    }

    let mut scripts = state.scripts.lock().unwrap();
    let script = scripts.get_mut(&id).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": format!("Job {id} not found") })),
        )
    })?;

    // Advance the script, keeping the final snapshot in place.
    let job = if script.len() > 1 {
        script.pop_front().unwrap()
    } else {
        script.front().cloned().unwrap()
    };
    Ok(Json(job))
}

async fn job_result(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<String>,
) -> ApiResult<Vec<u8>> {
    let results = state.results.lock().unwrap();
    match results.get(&id) {
        Some(bytes) => Ok(bytes.clone()),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": format!("Result for job {id} not available") })),
        )),
    }
}

async fn delete_job(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<String>,
) -> Json<Value> {
    state.deleted.lock().unwrap().push(id.clone());
    state.scripts.lock().unwrap().remove(&id);
    Json(json!({ "status": "deleted" }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "version": "1.0.0" }))
}
