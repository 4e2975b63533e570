#![forbid(unsafe_code)]

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use pulse_contracts::assessment::AssessmentRecord;
use pulse_contracts::link::LinkRecord;
use pulse_contracts::specialist::SpecialistRecord;

use crate::store::{StorageError, Store};

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug)]
pub enum SnapshotError {
    Io(std::io::Error),
    Json(serde_json::Error),
    SchemaVersion { got: u32 },
    Storage(StorageError),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Json(err) => write!(f, "json error: {err}"),
            Self::SchemaVersion { got } => {
                write!(f, "unsupported snapshot schema version: {got}")
            }
            Self::Storage(err) => write!(f, "snapshot rejected by store: {err:?}"),
        }
    }
}

impl std::error::Error for SnapshotError {}

impl From<std::io::Error> for SnapshotError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<StorageError> for SnapshotError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// The whole store as one JSON document: the three tables plus the id
/// sequences. Also serves as the `/db` dump payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub schema_version: u32,
    pub specialists: Vec<SpecialistRecord>,
    pub links: Vec<LinkRecord>,
    pub assessments: Vec<AssessmentRecord>,
    pub next_specialist_id: u64,
    pub next_link_id: u64,
    pub next_assessment_id: u64,
}

/// Loads a store from `path`; `Ok(None)` when no snapshot exists yet.
pub fn load(path: &Path) -> Result<Option<Store>, SnapshotError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(Some(Store::new()));
    }
    let snapshot = serde_json::from_str::<StoreSnapshot>(&raw)?;
    if snapshot.schema_version != SNAPSHOT_SCHEMA_VERSION {
        return Err(SnapshotError::SchemaVersion {
            got: snapshot.schema_version,
        });
    }
    Ok(Some(Store::from_snapshot(snapshot)?))
}

/// Writes the snapshot atomically: serialize, write a sibling tmp file,
/// rename over the target.
pub fn save(path: &Path, store: &Store) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let serialized = serde_json::to_vec_pretty(&store.to_snapshot())?;
    let mut tmp = path.to_path_buf();
    tmp.set_extension("tmp");
    fs::write(&tmp, serialized)?;
    fs::rename(tmp, path)?;
    Ok(())
}
