use anyhow::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::api::PresentationApi;
use crate::protocol::FileId;

const FILENAME: &str = "recent.yaml";
const APP_DIR: &str = "mdlive";
pub const MAX_RECENT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentEntry {
    #[serde(rename = "fileId")]
    pub file_id: FileId,
    pub filename: String,
    /// Seconds since the Unix epoch.
    #[serde(rename = "uploadedAt")]
    pub uploaded_at: u64,
}

impl RecentEntry {
    pub fn new(file_id: FileId, filename: impl Into<String>) -> Self {
        let uploaded_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            file_id,
            filename: filename.into(),
            uploaded_at,
        }
    }
}

/// Most recent first, at most [`MAX_RECENT`] entries, one per file id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentFiles {
    #[serde(default)]
    entries: Vec<RecentEntry>,
}

impl RecentFiles {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    /// A missing file is an empty list.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => anyhow::bail!("Failed to read recent files: {e}"),
        };
        let mut recent: RecentFiles = serde_yaml::from_str(&contents)?;
        recent.entries.truncate(MAX_RECENT);
        Ok(recent)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn entries(&self) -> &[RecentEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add(&mut self, entry: RecentEntry) {
        self.entries.retain(|e| e.file_id != entry.file_id);
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_RECENT);
    }

    pub fn remove(&mut self, file_id: &FileId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| &e.file_id != file_id);
        self.entries.len() != before
    }

    /// Drop entries the server no longer knows. Entries whose check fails
    /// for any other reason are kept. Returns how many were removed.
    pub fn prune(&mut self, api: &dyn PresentationApi) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| match api.check(&entry.file_id) {
            Ok(check) => {
                if !check.exists {
                    debug!("Pruning {} ({})", entry.filename, entry.file_id);
                }
                check.exists
            }
            Err(e) => {
                warn!("Could not check {}: {e}", entry.file_id);
                true
            }
        });
        before - self.entries.len()
    }
}
