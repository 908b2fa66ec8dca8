//! Checks done before a markdown file is handed to the server, and the
//! shape of the server's answer.

use std::path::Path;

use serde::Deserialize;

use crate::error::UploadError;
use crate::protocol::FileId;

pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Everything after the last dot must be an allowed extension, in any case.
pub fn validate_name(name: &str) -> Result<(), UploadError> {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .ok_or(UploadError::InvalidExtension)?;
    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(UploadError::InvalidExtension)
    }
}

pub fn validate(name: &str, size: u64) -> Result<(), UploadError> {
    validate_name(name)?;
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge {
            size,
            max: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

/// Validate a file on disk. Returns its size.
pub fn validate_path(path: &Path) -> anyhow::Result<u64> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", path.display()))?;
    let size = std::fs::metadata(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?
        .len();
    validate(name, size)?;
    Ok(size)
}

/// Body of the `/upload` reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub file_id: Option<FileId>,
    #[serde(default)]
    pub redirect: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uploaded {
    pub file_id: FileId,
    pub redirect: Option<String>,
}

impl UploadResponse {
    pub fn into_result(self) -> Result<Uploaded, UploadError> {
        match (self.success, self.file_id) {
            (true, Some(file_id)) => Ok(Uploaded {
                file_id,
                redirect: self.redirect,
            }),
            _ => Err(UploadError::Rejected(
                self.error.unwrap_or_else(|| "Upload failed".to_string()),
            )),
        }
    }
}
