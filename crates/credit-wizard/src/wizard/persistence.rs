use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::domain::{ApplicationState, FieldValue, FormData, SectionName, Step};
use super::validation::schema;

/// Fixed key of the wizard snapshot in the byte store.
pub const STORAGE_KEY: &str = "creditApplicationForm";

/// Durable key-value byte store backing the snapshot.
pub trait KeyValueStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failure: {0}")]
    Io(#[from] io::Error),
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Persisted layout of [`ApplicationState`].
///
/// Every field defaults when missing, null or of the wrong type. Unknown keys and
/// non-object `formData` entries are ignored, so older and newer snapshots both load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    #[serde(deserialize_with = "lenient")]
    pub current_step: i64,
    #[serde(deserialize_with = "lenient_form_data")]
    pub form_data: BTreeMap<String, BTreeMap<String, Value>>,
    #[serde(deserialize_with = "lenient_steps")]
    pub completed_steps: Vec<i64>,
    #[serde(deserialize_with = "lenient")]
    pub is_form_valid: bool,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).unwrap_or_else(|error| {
        debug!(%error, "defaulting unreadable snapshot field");
        T::default()
    }))
}

fn lenient_form_data<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, BTreeMap<String, Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(entries) = Value::deserialize(deserializer)? else {
        debug!("ignoring formData that is not an object");
        return Ok(BTreeMap::new());
    };

    Ok(entries
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Object(fields) => Some((key, fields.into_iter().collect())),
            _ => {
                debug!(entry = %key, "ignoring non-object formData entry");
                None
            }
        })
        .collect())
}

fn lenient_steps<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items.iter().filter_map(Value::as_i64).collect()),
        _ => {
            debug!("ignoring completedSteps that is not an array");
            Ok(Vec::new())
        }
    }
}

impl From<&ApplicationState> for Snapshot {
    fn from(state: &ApplicationState) -> Self {
        let form_data = SectionName::ALL
            .into_iter()
            .map(|section| {
                let fields = state
                    .section(section)
                    .iter()
                    .map(|(field, value)| (field.to_string(), value.to_json()))
                    .collect();
                (section.key().to_string(), fields)
            })
            .collect();

        Self {
            current_step: state.current_step.number() as i64,
            form_data,
            completed_steps: state
                .completed_steps
                .iter()
                .map(|step| step.number() as i64)
                .collect(),
            is_form_valid: state.is_form_valid,
        }
    }
}

impl From<Snapshot> for ApplicationState {
    fn from(snapshot: Snapshot) -> Self {
        let mut form_data = FormData::default();

        for section in SectionName::ALL {
            let Some(stored) = snapshot.form_data.get(section.key()) else {
                continue;
            };
            let schema = schema(section);
            let target = form_data.section_mut(section);
            for (field, raw) in stored {
                let Some(spec) = schema.field(field) else {
                    continue;
                };
                match FieldValue::from_json(raw) {
                    Some(value) if spec.kind.accepts(&value) => target.set(spec.name, value),
                    _ => debug!(%section, field = %field, "dropping incompatible persisted value"),
                }
            }
        }

        let completed_steps = snapshot
            .completed_steps
            .into_iter()
            .filter_map(|step| u8::try_from(step).ok().and_then(Step::new))
            .collect();

        Self {
            current_step: Step::clamped(snapshot.current_step),
            completed_steps,
            form_data,
            is_form_valid: snapshot.is_form_valid,
        }
    }
}

pub fn encode_snapshot(state: &ApplicationState) -> Result<Vec<u8>, StorageError> {
    Ok(serde_json::to_vec(&Snapshot::from(state))?)
}

pub fn decode_snapshot(bytes: &[u8]) -> Result<ApplicationState, StorageError> {
    let snapshot: Snapshot = serde_json::from_slice(bytes)?;
    Ok(ApplicationState::from(snapshot))
}

/// Best-effort persistence of the wizard state; failures are logged, never surfaced.
///
/// Saves are synchronous, so they land in mutation order. Several processes sharing one
/// store race with last-write-wins semantics.
pub struct SnapshotPersistence<S> {
    store: Arc<S>,
}

impl<S: KeyValueStore> SnapshotPersistence<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn save(&self, state: &ApplicationState) {
        let result = encode_snapshot(state).and_then(|bytes| self.store.write(STORAGE_KEY, &bytes));
        if let Err(error) = result {
            warn!(%error, "failed to persist wizard snapshot");
        }
    }

    /// Stored state, or `None` when absent or unreadable.
    pub fn load(&self) -> Option<ApplicationState> {
        let bytes = match self.store.read(STORAGE_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(error) => {
                warn!(%error, "failed to read wizard snapshot; starting from defaults");
                return None;
            }
        };

        match decode_snapshot(&bytes) {
            Ok(state) => Some(state),
            Err(error) => {
                warn!(%error, "discarding malformed wizard snapshot");
                None
            }
        }
    }

    pub fn clear(&self) {
        if let Err(error) = self.store.remove(STORAGE_KEY) {
            warn!(%error, "failed to clear wizard snapshot");
        }
    }
}

/// Process-local store, used by tests and the demo.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.entries()?.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.directory)?;

        // Write to temp file first, then rename atomically
        let target = self.path_for(key);
        let temp = self.directory.join(format!("{key}.json.tmp"));
        fs::write(&temp, bytes)?;
        fs::rename(&temp, &target)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}
