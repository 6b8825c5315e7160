//! Filesystem-backed store.
//!
//! Layout under the root directory:
//!
//! ```text
//! owners/<owner_id>/index.json
//! owners/<owner_id>/saves/<save_id>__<YYYYMMDDTHHMMSS.ffffffZ>.json
//! ```
//!
//! Every artifact is written to a temporary file in its final directory,
//! synced, then renamed over the target, so readers see either the old
//! bytes or the new ones. If more than one artifact exists for a save id
//! the latest timestamp wins; older ones are removed by the next write.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tempfile::NamedTempFile;

use super::{SaveStore, StoreError, validate_key};
use crate::index::SaveIndex;
use crate::locks::KeyedLocks;
use crate::logging::{debug, trace};
use crate::model::SaveRecord;

const OWNERS_DIR: &str = "owners";
const SAVES_DIR: &str = "saves";
const INDEX_FILE: &str = "index.json";
const ARTIFACT_EXT: &str = ".json";
const ID_SEPARATOR: &str = "__";
const ARTIFACT_TIME_FORMAT: &str = "%Y%m%dT%H%M%S%.6fZ";

/// Save store keeping JSON artifacts on the local filesystem.
pub struct FileStore {
    root: PathBuf,
    writes: KeyedLocks<()>,
}

impl FileStore {
    /// Open the store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(OWNERS_DIR))?;
        debug!(path = %root.display(), "opened save store");

        Ok(Self {
            root,
            writes: KeyedLocks::new(),
        })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn owner_dir(&self, owner_id: &str) -> Result<PathBuf, StoreError> {
        validate_key("owner", owner_id)?;
        Ok(self.root.join(OWNERS_DIR).join(owner_id))
    }

    fn saves_dir(&self, owner_id: &str) -> Result<PathBuf, StoreError> {
        Ok(self.owner_dir(owner_id)?.join(SAVES_DIR))
    }

    /// Existing artifacts for one save id, oldest first.
    fn artifacts_for(&self, owner_id: &str, save_id: &str) -> Result<Vec<PathBuf>, StoreError> {
        validate_key("save", save_id)?;
        let dir = self.saves_dir(owner_id)?;

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut artifacts: Vec<(String, PathBuf)> = Vec::new();
        for entry in entries {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some((id, stamp)) = file_name.to_str().and_then(parse_artifact_name) else {
                continue;
            };
            if id == save_id {
                artifacts.push((stamp.to_string(), entry.path()));
            }
        }

        artifacts.sort();
        Ok(artifacts.into_iter().map(|(_, path)| path).collect())
    }

    fn write_lock_key(owner_id: &str, name: &str) -> String {
        format!("{}/{}", owner_id, name)
    }
}

impl SaveStore for FileStore {
    fn write_record(&self, record: &SaveRecord) -> Result<(), StoreError> {
        let dir = self.saves_dir(&record.owner_id)?;
        validate_key("save", &record.save_id)?;
        let bytes = record
            .to_json_pretty()
            .map_err(|e| StoreError::Encode(e.to_string()))?;

        let key = Self::write_lock_key(&record.owner_id, &record.save_id);
        self.writes.with_slot(&key, |_| -> Result<(), StoreError> {
            fs::create_dir_all(&dir)?;
            let target = dir.join(artifact_name(&record.save_id, record.timestamp));
            write_atomic(&dir, &target, &bytes)?;
            trace!(path = %target.display(), bytes = bytes.len(), "wrote save artifact");

            for stale in self.artifacts_for(&record.owner_id, &record.save_id)? {
                if stale != target {
                    remove_if_exists(&stale)?;
                    trace!(path = %stale.display(), "removed superseded artifact");
                }
            }
            Ok(())
        })
    }

    fn read_record(&self, owner_id: &str, save_id: &str) -> Result<SaveRecord, StoreError> {
        let not_found = || StoreError::NotFound {
            owner_id: owner_id.to_string(),
            save_id: save_id.to_string(),
        };

        let artifacts = self.artifacts_for(owner_id, save_id)?;
        let Some(latest) = artifacts.last() else {
            return Err(not_found());
        };

        let bytes = match fs::read(latest) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };

        let record = SaveRecord::from_json_slice(&bytes).map_err(|e| StoreError::Corrupted {
            location: latest.display().to_string(),
            reason: e.to_string(),
            metadata_intact: metadata_intact(&bytes),
        })?;

        if record.owner_id != owner_id || record.save_id != save_id {
            return Err(StoreError::Corrupted {
                location: latest.display().to_string(),
                reason: format!(
                    "artifact holds save '{}' of owner '{}'",
                    record.save_id, record.owner_id
                ),
                metadata_intact: false,
            });
        }

        Ok(record)
    }

    fn record_exists(&self, owner_id: &str, save_id: &str) -> Result<bool, StoreError> {
        Ok(!self.artifacts_for(owner_id, save_id)?.is_empty())
    }

    fn delete_record(&self, owner_id: &str, save_id: &str) -> Result<bool, StoreError> {
        let key = Self::write_lock_key(owner_id, save_id);
        self.writes.with_slot(&key, |_| -> Result<bool, StoreError> {
            let mut removed = false;
            for artifact in self.artifacts_for(owner_id, save_id)? {
                removed |= remove_if_exists(&artifact)?;
            }
            Ok(removed)
        })
    }

    fn list_record_ids(&self, owner_id: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.saves_dir(owner_id)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = BTreeSet::new();
        for entry in entries {
            let entry = entry?;
            if let Some((id, _)) = entry.file_name().to_str().and_then(parse_artifact_name) {
                ids.insert(id.to_string());
            }
        }
        Ok(ids.into_iter().collect())
    }

    fn read_index(&self, owner_id: &str) -> Result<SaveIndex, StoreError> {
        let path = self.owner_dir(owner_id)?.join(INDEX_FILE);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(SaveIndex::new()),
            Err(e) => return Err(e.into()),
        };

        SaveIndex::from_json_slice(&bytes).map_err(|e| StoreError::Corrupted {
            location: path.display().to_string(),
            reason: e.to_string(),
            metadata_intact: false,
        })
    }

    fn write_index(&self, owner_id: &str, index: &SaveIndex) -> Result<(), StoreError> {
        let dir = self.owner_dir(owner_id)?;
        let bytes = index
            .to_json_pretty()
            .map_err(|e| StoreError::Encode(e.to_string()))?;

        let key = Self::write_lock_key(owner_id, INDEX_FILE);
        self.writes.with_slot(&key, |_| -> Result<(), StoreError> {
            fs::create_dir_all(&dir)?;
            write_atomic(&dir, &dir.join(INDEX_FILE), &bytes)?;
            trace!(owner = %owner_id, entries = index.len(), "wrote save index");
            Ok(())
        })
    }
}

fn artifact_name(save_id: &str, timestamp: DateTime<Utc>) -> String {
    format!(
        "{}{}{}{}",
        save_id,
        ID_SEPARATOR,
        timestamp.format(ARTIFACT_TIME_FORMAT),
        ARTIFACT_EXT
    )
}

/// Split `<save_id>__<stamp>.json` into its id and stamp.
fn parse_artifact_name(file_name: &str) -> Option<(&str, &str)> {
    let stem = file_name.strip_suffix(ARTIFACT_EXT)?;
    let (id, stamp) = stem.rsplit_once(ID_SEPARATOR)?;
    if id.is_empty() || stamp.is_empty() {
        return None;
    }
    Some((id, stamp))
}

fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(target).map_err(|e| StoreError::Unavailable(e.error))?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<bool, StoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Whether a damaged record still exposes a readable name and timestamp.
fn metadata_intact(bytes: &[u8]) -> bool {
    let Ok(Value::Object(object)) = serde_json::from_slice::<Value>(bytes) else {
        return false;
    };
    let name_ok = object.get("save_name").is_some_and(Value::is_string);
    let timestamp_ok = object
        .get("timestamp")
        .and_then(Value::as_str)
        .is_some_and(|s| s.parse::<DateTime<Utc>>().is_ok());
    name_ok && timestamp_ok
}
