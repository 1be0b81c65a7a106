//! The record store collaborator (C9, §4.9, §6): two read tables
//! (dataset files, per-formula annotations) and one append-only write
//! table (execution log rows).
//!
//! The original system backs this with a relational database; that is
//! explicitly out of this crate's scope (§1). The reference implementation
//! here is a single JSON file holding the same three collections, which is
//! enough to make `--log-db` and cost strategies 2/3 runnable end-to-end
//! without a database server.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// One row of the per-formula annotation table (§6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Annotation {
    pub filename: String,
    pub line: String,
    pub random_cost: Option<f64>,
    pub inconsistency_cost: Option<f64>,
}

/// One row of the execution-log write table (§4.7, §6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub dataset: String,
    pub alpha: String,
    pub strategy_param: u8,
    pub execution_time_ms: u128,
    pub peak_memory_bytes: Option<u64>,
    pub kernel_count: Option<u64>,
    pub branch_count: Option<u64>,
    pub tree_depth: Option<u32>,
    pub pruned_count: Option<u64>,
    pub boundary: Option<f64>,
    pub optimal_hitting_set: Option<Vec<String>>,
    pub timed_out: bool,
}

/// The two-tables-in/one-table-out capability the core reads and writes
/// through (§6 "Record store").
pub trait RecordStore {
    fn list_dataset_files(&self) -> Result<Vec<String>, StoreError>;
    fn annotations_for(&self, filename: &str) -> Result<Vec<Annotation>, StoreError>;
    fn append_execution_log(&self, record: &ExecutionRecord) -> Result<(), StoreError>;
}

#[derive(Default, Serialize, Deserialize)]
struct Tables {
    #[serde(default)]
    annotations: Vec<Annotation>,
    #[serde(default)]
    execution_log: Vec<ExecutionRecord>,
}

/// A single-file JSON-backed [`RecordStore`].
///
/// Every call re-reads/re-writes the whole file; this is adequate for the
/// scale of a CLI tool run interactively or in a batch script, and keeps
/// the collaborator boundary honest (no hidden in-memory cache that would
/// diverge from what's on disk between CLI invocations).
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    fn read(&self) -> Result<Tables, StoreError> {
        if !self.path.exists() {
            return Ok(Tables::default());
        }
        let text = std::fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        if text.trim().is_empty() {
            return Ok(Tables::default());
        }
        serde_json::from_str(&text).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, tables: &Tables) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(tables).expect("Tables is always serializable");
        std::fs::write(&self.path, text).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl RecordStore for JsonFileStore {
    fn list_dataset_files(&self) -> Result<Vec<String>, StoreError> {
        let tables = self.read()?;
        let mut names: Vec<String> = tables
            .annotations
            .iter()
            .map(|a| a.filename.clone())
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn annotations_for(&self, filename: &str) -> Result<Vec<Annotation>, StoreError> {
        let tables = self.read()?;
        let rows: Vec<Annotation> = tables
            .annotations
            .into_iter()
            .filter(|a| a.filename == filename)
            .collect();
        if rows.is_empty() {
            return Err(StoreError::UnknownDataset(filename.to_string()));
        }
        Ok(rows)
    }

    fn append_execution_log(&self, record: &ExecutionRecord) -> Result<(), StoreError> {
        let mut tables = self.read()?;
        tables.execution_log.push(record.clone());
        self.write(&tables)
    }
}

/// An in-memory [`RecordStore`] used in tests (and available to library
/// consumers who want annotations without touching the filesystem).
#[derive(Default)]
pub struct InMemoryStore {
    annotations: std::sync::Mutex<Vec<Annotation>>,
    execution_log: std::sync::Mutex<Vec<ExecutionRecord>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new(annotations: Vec<Annotation>) -> Self {
        InMemoryStore {
            annotations: std::sync::Mutex::new(annotations),
            execution_log: std::sync::Mutex::new(Vec::new()),
        }
    }
}

impl RecordStore for InMemoryStore {
    fn list_dataset_files(&self) -> Result<Vec<String>, StoreError> {
        let guard = self.annotations.lock().expect("lock poisoned");
        let mut names: Vec<String> = guard.iter().map(|a| a.filename.clone()).collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn annotations_for(&self, filename: &str) -> Result<Vec<Annotation>, StoreError> {
        let guard = self.annotations.lock().expect("lock poisoned");
        let rows: Vec<Annotation> = guard
            .iter()
            .filter(|a| a.filename == filename)
            .cloned()
            .collect();
        if rows.is_empty() {
            return Err(StoreError::UnknownDataset(filename.to_string()));
        }
        Ok(rows)
    }

    fn append_execution_log(&self, record: &ExecutionRecord) -> Result<(), StoreError> {
        self.execution_log
            .lock()
            .expect("lock poisoned")
            .push(record.clone());
        Ok(())
    }
}

/// Helper for tests/CLI bootstrap: reads a plain dataset file and turns it
/// into annotation rows under `filename`, with no cost values assigned.
pub fn annotations_from_plain_file(
    filename: &str,
    path: impl AsRef<Path>,
) -> std::io::Result<Vec<Annotation>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| Annotation {
            filename: filename.to_string(),
            line: l.to_string(),
            random_cost: None,
            inconsistency_cost: None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_store_round_trips_annotations() {
        let store = InMemoryStore::new(vec![Annotation {
            filename: "ds.txt".into(),
            line: "A0".into(),
            random_cost: Some(3.0),
            inconsistency_cost: None,
        }]);
        let rows = store.annotations_for("ds.txt").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].random_cost, Some(3.0));
    }

    #[test]
    fn unknown_dataset_is_an_error() {
        let store = InMemoryStore::default();
        assert!(store.annotations_for("missing.txt").is_err());
    }

    #[test]
    fn json_file_store_persists_execution_log_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let store = JsonFileStore::new(&path);
        store
            .append_execution_log(&ExecutionRecord {
                dataset: "ds".into(),
                alpha: "A0".into(),
                strategy_param: 1,
                execution_time_ms: 10,
                peak_memory_bytes: None,
                kernel_count: Some(1),
                branch_count: Some(0),
                tree_depth: Some(0),
                pruned_count: Some(0),
                boundary: Some(1.0),
                optimal_hitting_set: Some(vec!["A0".into()]),
                timed_out: false,
            })
            .unwrap();
        let reopened = JsonFileStore::new(&path);
        let tables = reopened.read().unwrap();
        assert_eq!(tables.execution_log.len(), 1);
    }
}
