//! File-based profile storage for studygate.
//!
//! Profiles are stored as JSON files in `~/.studygate/profiles/`.
//! Atomic writes are achieved via temp file + rename pattern. Each write
//! gets its own uniquely named temp file in the profiles directory.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use crate::config::profiles_dir;
use crate::core::{validate_user_id, ProfileRecord};
use crate::error::{Result, StudyGateError};
use crate::storage::EntitlementStore;

/// File-based profile storage.
///
/// One `<user_id>.json` per user. Writes are atomic per file; concurrent
/// writers on the same profile are last-writer-wins.
#[derive(Debug, Clone)]
pub struct FileEntitlementStore {
    profiles_dir: PathBuf,
}

impl FileEntitlementStore {
    /// Create a new file store with the default directory.
    ///
    /// Uses `~/.studygate/profiles/` or `$STUDYGATE_HOME/profiles/`.
    pub fn new() -> Result<Self> {
        let dir = profiles_dir().ok_or_else(|| {
            StudyGateError::config("Could not determine profiles directory (no home directory)")
        })?;
        Self::with_dir(dir)
    }

    /// Create a new file store with a custom directory.
    pub fn with_dir(profiles_dir: impl Into<PathBuf>) -> Result<Self> {
        let profiles_dir = profiles_dir.into();

        if !profiles_dir.exists() {
            fs::create_dir_all(&profiles_dir)
                .map_err(|e| StudyGateError::storage(&profiles_dir, e))?;
        }

        Ok(Self { profiles_dir })
    }

    /// Get the path for a profile file.
    fn profile_path(&self, user_id: &str) -> Result<PathBuf> {
        validate_user_id(user_id)?;
        Ok(self.profiles_dir.join(format!("{}.json", user_id)))
    }

    /// Write a profile atomically using temp file + rename.
    fn atomic_write(&self, record: &ProfileRecord) -> Result<()> {
        let final_path = self.profile_path(&record.user_id)?;
        let json = serde_json::to_string_pretty(record)?;

        let mut temp = NamedTempFile::new_in(&self.profiles_dir)
            .map_err(|e| StudyGateError::storage(&self.profiles_dir, e))?;
        temp.write_all(json.as_bytes())
            .map_err(|e| StudyGateError::storage(temp.path(), e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| StudyGateError::storage(temp.path(), e))?;

        temp.persist(&final_path)
            .map_err(|e| StudyGateError::storage(&final_path, e.error))?;

        Ok(())
    }
}

impl EntitlementStore for FileEntitlementStore {
    fn get(&self, user_id: &str) -> Result<Option<ProfileRecord>> {
        let path = self.profile_path(user_id)?;

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| StudyGateError::storage(&path, e))?;
        let record: ProfileRecord = serde_json::from_str(&content)?;

        Ok(Some(record))
    }

    fn put(&self, record: &ProfileRecord) -> Result<()> {
        self.atomic_write(record)
    }

    fn list(&self, limit: usize) -> Result<Vec<ProfileRecord>> {
        if !self.profiles_dir.exists() {
            return Ok(Vec::new());
        }

        let mut records: Vec<ProfileRecord> = Vec::new();

        let entries = fs::read_dir(&self.profiles_dir)
            .map_err(|e| StudyGateError::storage(&self.profiles_dir, e))?;

        for entry in entries {
            let entry = entry.map_err(|e| StudyGateError::storage(&self.profiles_dir, e))?;
            let path = entry.path();

            // Skip non-JSON files and temp files
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }
            if path
                .file_name()
                .map(|n| n.to_string_lossy().starts_with('.'))
                .unwrap_or(true)
            {
                continue;
            }

            match fs::read_to_string(&path)
                .map_err(StudyGateError::from)
                .and_then(|content| Ok(serde_json::from_str::<ProfileRecord>(&content)?))
            {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable profile");
                }
            }
        }

        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        records.truncate(limit);

        Ok(records)
    }

    fn delete(&self, user_id: &str) -> Result<()> {
        let path = self.profile_path(user_id)?;

        if path.exists() {
            fs::remove_file(&path).map_err(|e| StudyGateError::storage(&path, e))?;
        }

        Ok(())
    }
}
