use crate::error::AppError;
use crate::model::Task;
use crate::storage::backend::StorageBackend;
use serde::{Deserialize, Serialize};

pub const TASKS_STORAGE_KEY: &str = "privio_tasks";
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct SnapshotRef<'a> {
    schema_version: u32,
    tasks: &'a [Task],
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    schema_version: u32,
    tasks: Vec<Task>,
}

/// Encodes the whole collection as one versioned JSON document.
pub fn encode_snapshot(tasks: &[Task]) -> Result<String, AppError> {
    let snapshot = SnapshotRef {
        schema_version: SCHEMA_VERSION,
        tasks,
    };
    Ok(serde_json::to_string_pretty(&snapshot)?)
}

/// Decodes a snapshot. A bare array is the unversioned layout and reads as
/// schema version 0.
pub fn decode_snapshot(content: &str) -> Result<Vec<Task>, AppError> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    if value.is_array() {
        return Ok(serde_json::from_value(value)?);
    }

    let snapshot: Snapshot = serde_json::from_value(value)?;
    if snapshot.schema_version > SCHEMA_VERSION {
        return Err(AppError::invalid_data(format!(
            "schema_version {} is newer than supported version {}",
            snapshot.schema_version, SCHEMA_VERSION
        )));
    }
    Ok(snapshot.tasks)
}

/// Persists the task collection under a fixed key.
///
/// `load`, `save` and `clear` never fail: errors are logged and absorbed so
/// the caller always ends up with a usable (possibly empty) collection. The
/// `try_*` variants expose the underlying result.
#[derive(Debug)]
pub struct TaskStore {
    backend: Box<dyn StorageBackend>,
}

impl TaskStore {
    pub fn new<B: StorageBackend + 'static>(backend: B) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn try_load(&self) -> Result<Vec<Task>, AppError> {
        match self.backend.get(TASKS_STORAGE_KEY)? {
            Some(content) => decode_snapshot(&content),
            None => Ok(Vec::new()),
        }
    }

    pub fn load(&self) -> Vec<Task> {
        match self.try_load() {
            Ok(tasks) => {
                tracing::debug!(count = tasks.len(), "loaded tasks");
                tasks
            }
            Err(err) => {
                tracing::warn!(key = TASKS_STORAGE_KEY, error = %err, "failed to load tasks, starting empty");
                Vec::new()
            }
        }
    }

    pub fn try_save(&self, tasks: &[Task]) -> Result<(), AppError> {
        let content = encode_snapshot(tasks)?;
        self.backend.set(TASKS_STORAGE_KEY, &content)
    }

    pub fn save(&self, tasks: &[Task]) {
        if let Err(err) = self.try_save(tasks) {
            tracing::error!(key = TASKS_STORAGE_KEY, error = %err, "failed to save tasks");
        }
    }

    pub fn try_clear(&self) -> Result<(), AppError> {
        self.backend.remove(TASKS_STORAGE_KEY)
    }

    pub fn clear(&self) {
        if let Err(err) = self.try_clear() {
            tracing::error!(key = TASKS_STORAGE_KEY, error = %err, "failed to clear tasks");
        }
    }
}
