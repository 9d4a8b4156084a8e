//! JSON-backed completion store with atomic flushes.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::types::{Completion, StateError, StateRecord, StateResult, StateSummary};
use crate::models::{OperationKind, TaskStatus};

/// Durable map from `"<unit>:<operation>"` to [`StateRecord`].
///
/// The whole map is loaded once in [`StateStore::open`] and rewritten on
/// every update. Updates hold one lock across mutate and flush, so the file
/// always matches the latest successful `mark_*` call.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    records: Mutex<BTreeMap<String, StateRecord>>,
}

impl StateStore {
    /// Load the store at `path`.
    ///
    /// A missing file is an empty store. A file that cannot be parsed is
    /// [`StateError::Corrupt`]; nothing is recovered from it.
    pub fn open(path: impl Into<PathBuf>) -> StateResult<Self> {
        let path = path.into();

        let records = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<BTreeMap<String, StateRecord>>(&content)
                .map_err(|e| StateError::Corrupt {
                    path: path.clone(),
                    message: e.to_string(),
                })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StateError::ReadError { path, source }),
        };

        tracing::info!(
            "Loaded {} state records from {}",
            records.len(),
            path.display()
        );

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Key under which a (unit, operation) record is stored.
    pub fn key(unit_id: &str, op: OperationKind) -> String {
        format!("{}:{}", unit_id, op.as_str())
    }

    /// Copy of the current record, if any.
    pub fn record(&self, unit_id: &str, op: OperationKind) -> Option<StateRecord> {
        self.records.lock().get(&Self::key(unit_id, op)).cloned()
    }

    /// Check the record and its outputs against the filesystem.
    pub fn completion(&self, unit_id: &str, op: OperationKind) -> Completion {
        let Some(record) = self.record(unit_id, op) else {
            return Completion::NotCompleted;
        };
        if record.status != TaskStatus::Completed {
            return Completion::NotCompleted;
        }

        let missing: Vec<PathBuf> = record
            .output_paths
            .into_iter()
            .filter(|p| !p.exists())
            .collect();

        if missing.is_empty() {
            Completion::Completed
        } else {
            Completion::OutputsMissing(missing)
        }
    }

    /// True only if recorded as completed and every output still exists.
    pub fn is_completed(&self, unit_id: &str, op: OperationKind) -> bool {
        self.completion(unit_id, op) == Completion::Completed
    }

    /// Record a completion with its outputs and flush.
    pub fn mark_completed(
        &self,
        unit_id: &str,
        op: OperationKind,
        outputs: &[PathBuf],
    ) -> StateResult<()> {
        self.update(unit_id, op, StateRecord::completed(outputs.to_vec()))
    }

    /// Record a failure and flush. Outputs are cleared.
    pub fn mark_failed(&self, unit_id: &str, op: OperationKind, error: &str) -> StateResult<()> {
        self.update(unit_id, op, StateRecord::failed(error))
    }

    /// Count records by status.
    pub fn summary(&self) -> StateSummary {
        let records = self.records.lock();
        let mut summary = StateSummary {
            total: records.len(),
            ..Default::default()
        };
        for record in records.values() {
            match record.status {
                TaskStatus::Completed => summary.completed += 1,
                TaskStatus::Failed => summary.failed += 1,
                _ => summary.other += 1,
            }
        }
        summary
    }

    fn update(&self, unit_id: &str, op: OperationKind, record: StateRecord) -> StateResult<()> {
        let key = Self::key(unit_id, op);
        let mut records = self.records.lock();

        let previous = records.insert(key.clone(), record);
        if let Err(e) = self.flush(&records) {
            // Keep memory in step with what is on disk.
            match previous {
                Some(old) => records.insert(key, old),
                None => records.remove(&key),
            };
            return Err(e);
        }

        tracing::debug!("State updated: {}", key);
        Ok(())
    }

    /// Write the full map to a temp file, sync, then rename over the store.
    fn flush(&self, records: &BTreeMap<String, StateRecord>) -> StateResult<()> {
        let content = serde_json::to_string_pretty(records)?;
        self.atomic_write(&content)
            .map_err(|source| StateError::WriteError {
                path: self.path.clone(),
                source,
            })
    }

    fn atomic_write(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, &self.path)
    }
}
