use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, Utc};
use tracing::warn;

use super::{LogRoot, StorageError};

/// Appends completed fights to the current week's log file.
pub struct LogWriter {
    dir: PathBuf,
    recorder_id: String,
}

impl LogWriter {
    pub fn new(dir: PathBuf, recorder_id: String) -> Self {
        Self { dir, recorder_id }
    }

    pub fn recorder_id(&self) -> &str {
        &self.recorder_id
    }

    /// Path of the file this week's fights land in, named after the week's
    /// Monday so a week of play stays in one file.
    pub fn current_log_path(&self) -> PathBuf {
        let today = Utc::now().date_naive();
        let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        self.dir
            .join(format!("log_{monday}_{}.json", self.recorder_id))
    }

    pub fn append(&self, root: LogRoot) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| StorageError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.current_log_path();
        let mut roots = read_existing(&path);
        roots.push(root);
        let json = serde_json::to_string_pretty(&roots)?;
        std::fs::write(&path, json).map_err(|source| StorageError::WriteFile { path, source })
    }
}

/// Existing records, or empty when the file is missing or unreadable. A
/// corrupt week file costs its history but never blocks new fights.
fn read_existing(path: &Path) -> Vec<LogRoot> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    match serde_json::from_str(&content) {
        Ok(roots) => roots,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "log file corrupt, starting a new one");
            Vec::new()
        }
    }
}
