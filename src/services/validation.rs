use crate::config::ClientConfig;
use crate::models::upload::UploadFile;

/// Client-detected bad input, raised before any network call is made.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("no file selected")]
    MissingFileName,

    #[error(
        "unsupported file format: {}. File: {file_name}",
        .declared.as_deref().unwrap_or("unknown")
    )]
    UnsupportedFormat {
        file_name: String,
        declared: Option<String>,
    },

    #[error("file size {size} exceeds the {limit} byte upload limit")]
    TooLarge { size: u64, limit: u64 },
}

/// Validate a local file against the configured constraints.
///
/// A file is accepted when its declared MIME type is in the accepted set,
/// or, as a fallback, its lowercased name carries an accepted extension.
/// The size ceiling is checked afterwards. Runs entirely client-side.
pub fn check_upload(file: &UploadFile, config: &ClientConfig) -> Result<(), ValidationError> {
    if file.file_name.is_empty() {
        return Err(ValidationError::MissingFileName);
    }

    let type_accepted = file
        .content_type
        .as_deref()
        .is_some_and(|t| config.accepted_mime_types.iter().any(|a| a == t));

    let extension_accepted = {
        let lower = file.file_name.to_lowercase();
        config
            .accepted_extensions
            .iter()
            .any(|ext| lower.ends_with(&format!(".{ext}")))
    };

    if !type_accepted && !extension_accepted {
        return Err(ValidationError::UnsupportedFormat {
            file_name: file.file_name.clone(),
            declared: file.content_type.clone(),
        });
    }

    if file.size() > config.max_upload_bytes {
        return Err(ValidationError::TooLarge {
            size: file.size(),
            limit: config.max_upload_bytes,
        });
    }

    Ok(())
}
