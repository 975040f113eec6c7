//! Session storage — JSON reports on disk, keyed by test name and a
//! per-test sequence number.
//!
//! Files are named `{test_name}_{n}.json` with the lowest free `n`
//! starting at 1, so deleting a session leaves a hole that the next save
//! fills. This mirrors the reference deployment's session naming and
//! keeps filenames human-browsable; the content-hash run id lives inside
//! the report.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::export::{export_json, import_json};
use crate::session::SessionReport;

/// Directory-backed store for session reports.
#[derive(Debug, Clone)]
pub struct SessionStore {
    data_dir: PathBuf,
}

impl SessionStore {
    /// Open (creating if needed) a store at the given directory.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Save a report under the lowest free sequence number for its test
    /// name. Returns the path written.
    pub fn save(&self, report: &SessionReport) -> Result<PathBuf> {
        let seq = self.next_sequence(&report.config.name)?;
        let path = self.path_for(&report.config.name, seq);
        let json = export_json(report)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), run_id = %report.run_id, "session saved");
        Ok(path)
    }

    /// Load one report, rejecting unknown schema versions.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<SessionReport> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        import_json(&json).with_context(|| format!("failed to load {}", path.display()))
    }

    /// All stored sessions for a test name, in sequence order.
    pub fn list(&self, test_name: &str) -> Result<Vec<PathBuf>> {
        let mut found: Vec<(u32, PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(&self.data_dir)
            .with_context(|| format!("failed to list {}", self.data_dir.display()))?
        {
            let path = entry?.path();
            if let Some(seq) = Self::sequence_of(&path, test_name) {
                found.push((seq, path));
            }
        }
        found.sort_by_key(|(seq, _)| *seq);
        Ok(found.into_iter().map(|(_, path)| path).collect())
    }

    fn path_for(&self, test_name: &str, seq: u32) -> PathBuf {
        self.data_dir.join(format!("{test_name}_{seq}.json"))
    }

    /// Lowest sequence number not already on disk for this test name.
    fn next_sequence(&self, test_name: &str) -> Result<u32> {
        let mut used: Vec<u32> = Vec::new();
        for entry in std::fs::read_dir(&self.data_dir)
            .with_context(|| format!("failed to list {}", self.data_dir.display()))?
        {
            let path = entry?.path();
            if let Some(seq) = Self::sequence_of(&path, test_name) {
                used.push(seq);
            }
        }
        used.sort_unstable();
        let mut seq = 1;
        for &taken in &used {
            if taken == seq {
                seq += 1;
            } else if taken > seq {
                break;
            }
        }
        Ok(seq)
    }

    /// Parse `{test_name}_{n}.json`; `None` for anything else.
    fn sequence_of(path: &Path, test_name: &str) -> Option<u32> {
        let stem = path.file_stem()?.to_str()?;
        if path.extension()?.to_str()? != "json" {
            return None;
        }
        let suffix = stem.strip_prefix(test_name)?.strip_prefix('_')?;
        suffix.parse().ok()
    }
}
