use serde::Deserialize;

/// Client configuration, loadable from `VIDBLUR_`-prefixed environment
/// variables. Every field has a default so the client works out of the box
/// against a local backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the redaction service API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Upload size ceiling in bytes, enforced before any network call.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// Fixed delay between status polls for one job, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// MIME types accepted for upload.
    #[serde(default = "default_accepted_mime_types")]
    pub accepted_mime_types: Vec<String>,

    /// Filename extensions accepted as a fallback when the declared MIME
    /// type is absent or unrecognized (lowercase, without the dot).
    #[serde(default = "default_accepted_extensions")]
    pub accepted_extensions: Vec<String>,
}

fn default_api_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_max_upload_bytes() -> u64 {
    500 * 1024 * 1024
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_accepted_mime_types() -> Vec<String> {
    vec!["video/mp4".to_string(), "video/quicktime".to_string()]
}

fn default_accepted_extensions() -> Vec<String> {
    vec!["mp4".to_string(), "mov".to_string()]
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            max_upload_bytes: default_max_upload_bytes(),
            poll_interval_ms: default_poll_interval_ms(),
            accepted_mime_types: default_accepted_mime_types(),
            accepted_extensions: default_accepted_extensions(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::prefixed("VIDBLUR_").from_env()
    }
}
