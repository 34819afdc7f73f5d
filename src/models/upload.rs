use std::path::Path;

/// A local file selected for submission: name, declared content type, and
/// the raw bytes that will form the multipart body.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    /// MIME type as declared by the picker, if any. Validation falls back
    /// to the filename extension when this is absent or unrecognized.
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: Option<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            data,
        }
    }

    /// Read a file from disk, inferring the content type from its extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = content_type_for_name(&file_name);
        Ok(Self {
            file_name,
            content_type,
            data,
        })
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

fn content_type_for_name(name: &str) -> Option<String> {
    let lower = name.to_lowercase();
    if lower.ends_with(".mp4") {
        Some("video/mp4".to_string())
    } else if lower.ends_with(".mov") {
        Some("video/quicktime".to_string())
    } else {
        None
    }
}
