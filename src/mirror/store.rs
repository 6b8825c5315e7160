//! Client mirror implementation using fjall.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use fjall::{Keyspace, KeyspaceCreateOptions, PersistMode};

use crate::index::SaveIndex;
use crate::logging::{debug, info, warn};
use crate::model::{SaveRecord, SaveSummary, StorageLocation};

use super::error::MirrorError;
use super::format;

/// Keys in the metadata keyspace.
const META_CONFIG_KEY: &str = "config";
const META_INDEX_KEY: &str = "index";

/// Keyspace names.
const META_KEYSPACE: &str = "_meta";
const RECORDS_KEYSPACE: &str = "records";

/// Current mirror layout version.
const MIRROR_VERSION: u32 = 1;

/// Local save mirror backed by fjall.
pub struct ClientMirror {
    db: fjall::Database,
    meta: Keyspace,
    records: Keyspace,
    /// Serializes read-modify-write of the local index.
    index_lock: Mutex<()>,
}

impl ClientMirror {
    /// Open an existing mirror at the given path.
    pub fn open(path: &Path) -> Result<Self, MirrorError> {
        if !path.exists() {
            return Err(MirrorError::NotInitialized(path.display().to_string()));
        }

        let db = fjall::Database::builder(path).open()?;
        let meta = db.keyspace(META_KEYSPACE, KeyspaceCreateOptions::default)?;

        let Some(config) = meta.get(META_CONFIG_KEY)? else {
            return Err(MirrorError::NotInitialized(path.display().to_string()));
        };
        let version = u32::from_le_bytes(
            config
                .as_ref()
                .try_into()
                .map_err(|_| MirrorError::InvalidFormat("Invalid config format".to_string()))?,
        );
        if version != MIRROR_VERSION {
            return Err(MirrorError::InvalidFormat(format!(
                "Mirror version mismatch: expected {}, got {}",
                MIRROR_VERSION, version
            )));
        }

        let records = db.keyspace(RECORDS_KEYSPACE, KeyspaceCreateOptions::default)?;
        debug!(path = %path.display(), "opened client mirror");

        Ok(Self {
            db,
            meta,
            records,
            index_lock: Mutex::new(()),
        })
    }

    /// Initialize a new mirror at the given path.
    pub fn init(path: &Path) -> Result<Self, MirrorError> {
        let db = fjall::Database::builder(path).open()?;
        let meta = db.keyspace(META_KEYSPACE, KeyspaceCreateOptions::default)?;
        let records = db.keyspace(RECORDS_KEYSPACE, KeyspaceCreateOptions::default)?;

        meta.insert(META_CONFIG_KEY, MIRROR_VERSION.to_le_bytes())?;
        db.persist(PersistMode::SyncAll)?;
        info!(path = %path.display(), "initialized client mirror");

        Ok(Self {
            db,
            meta,
            records,
            index_lock: Mutex::new(()),
        })
    }

    /// Open the mirror at `path`, initializing it on first use.
    pub fn open_or_init(path: &Path) -> Result<Self, MirrorError> {
        match Self::open(path) {
            Err(MirrorError::NotInitialized(_)) => Self::init(path),
            other => other,
        }
    }

    /// Store a full record locally and upsert its local index entry.
    ///
    /// Last writer wins for a given save id; the stored timestamp never
    /// moves backward.
    pub fn mirror_save(&self, record: &SaveRecord) -> Result<SaveSummary, MirrorError> {
        record
            .validate()
            .map_err(|e| MirrorError::InvalidFormat(e.to_string()))?;

        let _guard = self.index_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut record = record.clone();
        match self.load_record(&record.save_id) {
            Ok(Some(previous)) => record.clamp_timestamp(previous.timestamp),
            Ok(None) => {}
            Err(MirrorError::Corrupted { reason: _reason, .. }) => {
                warn!(save_id = %record.save_id, reason = %_reason, "overwriting corrupted local entry");
            }
            Err(e) => return Err(e),
        }

        let payload = record
            .to_json_pretty()
            .map_err(|e| MirrorError::Encode(e.to_string()))?;
        self.records
            .insert(record.save_id.as_str(), format::encode(&payload))?;

        let summary = record.summary(StorageLocation::Local);
        let mut index = self.load_index()?;
        index.upsert(summary.clone());
        self.store_index(&index)?;

        self.db.persist(PersistMode::SyncAll)?;
        debug!(save_id = %summary.save_id, "mirrored save locally");
        Ok(summary)
    }

    /// Local saves, newest first.
    ///
    /// Index entries without a local record are dropped.
    pub fn list_local(&self) -> Result<Vec<SaveSummary>, MirrorError> {
        let _guard = self.index_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut index = self.load_index()?;
        let mut lookup_error = None;
        let dropped = index.retain(|entry| match self.records.get(entry.save_id.as_str()) {
            Ok(value) => value.is_some(),
            Err(e) => {
                if lookup_error.is_none() {
                    lookup_error = Some(e);
                }
                true
            }
        });
        if let Some(e) = lookup_error {
            return Err(e.into());
        }

        if !dropped.is_empty() {
            warn!(dropped = dropped.len(), "purging local index entries without record");
            self.store_index(&index)?;
            self.db.persist(PersistMode::SyncAll)?;
        }

        Ok(index.entries().to_vec())
    }

    /// A locally stored record.
    pub fn get_local(&self, save_id: &str) -> Result<Option<SaveRecord>, MirrorError> {
        self.load_record(save_id)
    }

    /// Delete a local record and its index entry. Returns `false` if
    /// neither existed.
    pub fn delete_local(&self, save_id: &str) -> Result<bool, MirrorError> {
        let _guard = self.index_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let had_record = self.records.get(save_id)?.is_some();
        self.records.remove(save_id)?;

        let mut index = self.load_index()?;
        let had_entry = index.remove(save_id).is_some();
        if had_entry {
            self.store_index(&index)?;
        }

        self.db.persist(PersistMode::SyncAll)?;
        Ok(had_record || had_entry)
    }

    /// Serialize a local record as a standalone save document.
    pub fn export_local(&self, save_id: &str) -> Result<Vec<u8>, MirrorError> {
        let record = self
            .load_record(save_id)?
            .ok_or_else(|| MirrorError::NotFound(save_id.to_string()))?;
        record
            .to_json_pretty()
            .map_err(|e| MirrorError::Encode(e.to_string()))
    }

    /// Validate an external save document and mirror it locally.
    ///
    /// Nothing is written when the document is rejected.
    pub fn import_external(&self, bytes: &[u8]) -> Result<SaveRecord, MirrorError> {
        let record = SaveRecord::from_json_slice(bytes)
            .map_err(|e| MirrorError::InvalidFormat(e.to_string()))?;
        let summary = self.mirror_save(&record)?;
        info!(save_id = %summary.save_id, name = %summary.save_name, "imported save");

        self.load_record(&record.save_id)?
            .ok_or_else(|| MirrorError::NotFound(record.save_id.clone()))
    }

    // Helper methods

    fn load_record(&self, save_id: &str) -> Result<Option<SaveRecord>, MirrorError> {
        let Some(bytes) = self.records.get(save_id)? else {
            return Ok(None);
        };

        let corrupted = |reason: String| MirrorError::Corrupted {
            save_id: save_id.to_string(),
            reason,
        };
        let payload = format::decode(bytes.as_ref()).map_err(|e| corrupted(e.to_string()))?;
        let record = SaveRecord::from_json_slice(payload).map_err(|e| corrupted(e.to_string()))?;
        Ok(Some(record))
    }

    fn load_index(&self) -> Result<SaveIndex, MirrorError> {
        let Some(bytes) = self.meta.get(META_INDEX_KEY)? else {
            return Ok(SaveIndex::new());
        };

        match SaveIndex::from_json_slice(bytes.as_ref()) {
            Ok(index) => Ok(index),
            Err(_e) => {
                warn!(error = %_e, "local index unreadable, starting empty");
                Ok(SaveIndex::new())
            }
        }
    }

    fn store_index(&self, index: &SaveIndex) -> Result<(), MirrorError> {
        let bytes = index
            .to_json_pretty()
            .map_err(|e| MirrorError::Encode(e.to_string()))?;
        self.meta.insert(META_INDEX_KEY, bytes)?;
        Ok(())
    }
}
