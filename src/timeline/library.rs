//! Recordings directory
//!
//! A recordings directory is a flat folder of `*.json` timelines. Listing is
//! newest first by modification time, ties broken by file name so
//! timestamped names still sort sensibly.

use super::store::{Timeline, TimelineSummary};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// One file in a recordings directory.
#[derive(Debug, Clone)]
pub struct RecordingEntry {
    pub path: PathBuf,
    pub modified: SystemTime,
    /// `None` if the file could not be loaded as a timeline
    pub summary: Option<TimelineSummary>,
}

impl RecordingEntry {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn json_files(dir: &Path) -> crate::Result<Vec<(PathBuf, SystemTime)>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let read = std::fs::read_dir(dir).map_err(|source| crate::Error::FileIo {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<(PathBuf, SystemTime)> = read
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
        .filter_map(|entry| {
            let meta = entry.metadata().ok()?;
            meta.is_file()
                .then(|| (entry.path(), meta.modified().unwrap_or(SystemTime::UNIX_EPOCH)))
        })
        .collect();

    files.sort_by(|(a_path, a_time), (b_path, b_time)| {
        b_time.cmp(a_time).then_with(|| b_path.cmp(a_path))
    });
    Ok(files)
}

/// Every recording in `dir`, newest first. A missing directory is empty.
pub fn list_recordings(dir: &Path) -> crate::Result<Vec<RecordingEntry>> {
    Ok(json_files(dir)?
        .into_iter()
        .map(|(path, modified)| {
            let summary = match Timeline::load(&path) {
                Ok(timeline) => Some(timeline.summary()),
                Err(e) => {
                    debug!("Skipping summary for {}: {e}", path.display());
                    None
                }
            };
            RecordingEntry {
                path,
                modified,
                summary,
            }
        })
        .collect())
}

/// The newest recording in `dir`, if any.
pub fn most_recent(dir: &Path) -> crate::Result<Option<PathBuf>> {
    Ok(json_files(dir)?.into_iter().next().map(|(path, _)| path))
}
