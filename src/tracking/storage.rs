//! Stats storage backends
//!
//! The `StatsBackend` trait plus a JSON file-based implementation for
//! durable records and an in-memory one for tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::Stats;

/// Errors from stats storage operations
#[derive(Debug, thiserror::Error)]
pub enum StatsStorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stats record not found: {0}")]
    NotFound(String),
}

/// Result alias for stats storage operations
pub type Result<T> = std::result::Result<T, StatsStorageError>;

/// Persistence for per-run stats records
pub trait StatsBackend {
    /// Whether a record exists for the run
    fn exists(&self, run_name: &str) -> bool;

    /// Overwrite the run's record in full. Must be atomic: concurrent
    /// readers see either the old or the new record, never a prefix.
    fn save(&mut self, run_name: &str, stats: &Stats) -> Result<()>;

    /// Load the run's record
    fn load(&self, run_name: &str) -> Result<Stats>;
}

/// JSON file-based stats backend
///
/// Stores each run as `{run_name}.json` inside a directory. Writes go to
/// a temporary sibling first and are renamed into place, so a flush
/// either lands completely or not at all.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    fn record_path(&self, run_name: &str) -> PathBuf {
        self.dir.join(format!("{run_name}.json"))
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }
}

impl StatsBackend for JsonFileBackend {
    fn exists(&self, run_name: &str) -> bool {
        self.record_path(run_name).exists()
    }

    fn save(&mut self, run_name: &str, stats: &Stats) -> Result<()> {
        self.ensure_dir()?;
        let json = serde_json::to_string_pretty(stats)?;
        let path = self.record_path(run_name);
        let tmp = self.dir.join(format!("{run_name}.json.tmp"));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn load(&self, run_name: &str) -> Result<Stats> {
        let path = self.record_path(run_name);
        if !path.exists() {
            return Err(StatsStorageError::NotFound(run_name.to_string()));
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// In-memory stats backend for testing. No persistence.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    records: HashMap<String, Stats>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatsBackend for InMemoryBackend {
    fn exists(&self, run_name: &str) -> bool {
        self.records.contains_key(run_name)
    }

    fn save(&mut self, run_name: &str, stats: &Stats) -> Result<()> {
        self.records.insert(run_name.to_string(), stats.clone());
        Ok(())
    }

    fn load(&self, run_name: &str) -> Result<Stats> {
        self.records
            .get(run_name)
            .cloned()
            .ok_or_else(|| StatsStorageError::NotFound(run_name.to_string()))
    }
}
