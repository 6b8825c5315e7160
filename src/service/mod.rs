//! Save/load orchestration.
//!
//! [`SaveService`] owns the in-memory copy of every owner's index while the
//! process runs. Each owner's index lives inside that owner's lock slot, so
//! a whole "read index, touch records, write index" sequence is one critical
//! section per owner and different owners never wait on each other.

mod error;

pub use error::SaveError;

use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::index::SaveIndex;
use crate::locks::{KeyedLocks, lock_slot};
use crate::logging::{debug, error, info, warn};
use crate::model::{LiveGame, SaveRecord, SaveSummary, StorageLocation};
use crate::store::{SaveStore, StoreError, validate_key};

/// Cached index for one owner. `None` until first loaded from the store.
#[derive(Debug, Default)]
struct OwnerSlot {
    index: Option<SaveIndex>,
}

/// Server-side save/load service.
pub struct SaveService {
    store: Arc<dyn SaveStore>,
    owners: KeyedLocks<OwnerSlot>,
}

impl SaveService {
    pub fn new(store: Arc<dyn SaveStore>) -> Self {
        Self {
            store,
            owners: KeyedLocks::new(),
        }
    }

    /// Save the owner's live game under a freshly allocated id.
    ///
    /// `live` is `None` when the owner has no game running. A character that
    /// has not finished creation (no name) cannot be saved either.
    pub fn create_save(
        &self,
        owner_id: &str,
        live: Option<&LiveGame>,
        save_name: Option<&str>,
    ) -> Result<SaveSummary, SaveError> {
        let game = live
            .filter(|game| game.character.is_created())
            .ok_or_else(|| SaveError::NoActiveCharacter(owner_id.to_string()))?;

        let record = SaveRecord::capture(owner_id, game, save_name, Utc::now());
        record.validate()?;
        let summary = record.summary(StorageLocation::Server);

        let slot = self.owner_slot(owner_id)?;
        let mut slot = lock_slot(&slot);
        let mut index = self.cached_index(owner_id, &mut slot)?;

        self.store
            .write_record(&record)
            .map_err(|e| SaveError::from_store(e, &record.save_id))?;

        index.upsert(summary.clone());
        if let Err(e) = self.store.write_index(owner_id, &index) {
            error!(owner = %owner_id, save_id = %record.save_id, error = %e, "index write failed, rolling back record");
            if let Err(_rollback) = self.store.delete_record(owner_id, &record.save_id) {
                warn!(owner = %owner_id, save_id = %record.save_id, error = %_rollback, "rollback failed, record left for reindex");
            }
            return Err(SaveError::from_store(e, &record.save_id));
        }
        slot.index = Some(index);

        info!(owner = %owner_id, save_id = %summary.save_id, name = %summary.save_name, "save created");
        Ok(summary)
    }

    /// The owner's saves, newest first.
    ///
    /// Entries whose record has disappeared are dropped from the result and
    /// from the persisted index.
    pub fn list_saves(&self, owner_id: &str) -> Result<Vec<SaveSummary>, SaveError> {
        let slot = self.owner_slot(owner_id)?;
        let mut slot = lock_slot(&slot);
        let mut index = self.cached_index(owner_id, &mut slot)?;

        let mut lookup_error: Option<StoreError> = None;
        let dropped = index.retain(|entry| match self.store.record_exists(owner_id, &entry.save_id) {
            Ok(exists) => exists,
            Err(e) => {
                // Keep the entry when the medium itself is failing.
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
            warn!(
                owner = %owner_id,
                save_ids = ?dropped.iter().map(|e| e.save_id.as_str()).collect::<Vec<_>>(),
                "purging index entries without record"
            );
            self.store.write_index(owner_id, &index)?;
        }

        let saves = index.entries().to_vec();
        slot.index = Some(index);
        Ok(saves)
    }

    /// Read a save back for the caller to apply to live state.
    pub fn load_save(&self, owner_id: &str, save_id: &str) -> Result<SaveRecord, SaveError> {
        let slot = self.owner_slot(owner_id)?;
        let mut slot = lock_slot(&slot);
        let mut index = self.cached_index(owner_id, &mut slot)?;

        if !index.contains(save_id) {
            return Err(SaveError::SaveNotFound(save_id.to_string()));
        }

        match self.store.read_record(owner_id, save_id) {
            Ok(record) => {
                debug!(owner = %owner_id, save_id = %save_id, "save loaded");
                slot.index = Some(index);
                Ok(record)
            }
            Err(StoreError::NotFound { .. }) => {
                warn!(owner = %owner_id, save_id = %save_id, "record missing, purging index entry");
                index.remove(save_id);
                self.store.write_index(owner_id, &index)?;
                slot.index = Some(index);
                Err(SaveError::SaveNotFound(save_id.to_string()))
            }
            Err(StoreError::Corrupted {
                reason,
                metadata_intact,
                ..
            }) => {
                warn!(
                    owner = %owner_id,
                    save_id = %save_id,
                    reason = %reason,
                    metadata_intact = metadata_intact,
                    "save record corrupted"
                );
                if !metadata_intact {
                    index.remove(save_id);
                    self.store.write_index(owner_id, &index)?;
                }
                slot.index = Some(index);
                Err(SaveError::SaveCorrupted {
                    save_id: save_id.to_string(),
                    reason,
                })
            }
            Err(e) => Err(SaveError::from_store(e, save_id)),
        }
    }

    /// Delete a save. Returns `false` when there was nothing to delete.
    ///
    /// The index entry is removed even if the record artifact is already
    /// gone.
    pub fn delete_save(&self, owner_id: &str, save_id: &str) -> Result<bool, SaveError> {
        let slot = self.owner_slot(owner_id)?;
        let mut slot = lock_slot(&slot);
        let mut index = self.cached_index(owner_id, &mut slot)?;

        let record_removed = match self.store.delete_record(owner_id, save_id) {
            Ok(removed) => removed,
            Err(StoreError::InvalidKey { kind: "save", .. }) => false,
            Err(e) => return Err(SaveError::from_store(e, save_id)),
        };

        let entry_removed = index.remove(save_id).is_some();
        if entry_removed {
            self.store.write_index(owner_id, &index)?;
        }
        slot.index = Some(index);

        let deleted = entry_removed || record_removed;
        if deleted {
            info!(owner = %owner_id, save_id = %save_id, "save deleted");
        } else {
            debug!(owner = %owner_id, save_id = %save_id, "delete of unknown save");
        }
        Ok(deleted)
    }

    /// Re-derive the owner's index from the record artifacts in the store.
    ///
    /// Corrupted records are skipped. Use after an index artifact was lost
    /// or replaced by an empty one.
    pub fn rebuild_index(&self, owner_id: &str) -> Result<Vec<SaveSummary>, SaveError> {
        let slot = self.owner_slot(owner_id)?;
        let mut slot = lock_slot(&slot);

        let mut summaries = Vec::new();
        for save_id in self.store.list_record_ids(owner_id)? {
            match self.store.read_record(owner_id, &save_id) {
                Ok(record) => summaries.push(record.summary(StorageLocation::Server)),
                Err(_e @ StoreError::Corrupted { .. }) => {
                    warn!(owner = %owner_id, save_id = %save_id, error = %_e, "skipping corrupted record");
                }
                Err(StoreError::NotFound { .. }) => {}
                Err(e) => return Err(SaveError::from_store(e, &save_id)),
            }
        }

        let index = SaveIndex::from_summaries(summaries);
        self.store.write_index(owner_id, &index)?;
        info!(owner = %owner_id, entries = index.len(), "index rebuilt");

        let saves = index.entries().to_vec();
        slot.index = Some(index);
        Ok(saves)
    }

    /// Lock slot of a valid owner. Invalid ids are rejected before a slot
    /// is allocated for them.
    fn owner_slot(&self, owner_id: &str) -> Result<Arc<Mutex<OwnerSlot>>, SaveError> {
        validate_key("owner", owner_id)?;
        Ok(self.owners.slot(owner_id))
    }

    /// Working copy of the owner's index, loading it on first use.
    ///
    /// An unreadable index artifact is replaced by an empty one rather than
    /// blocking the owner; the records stay on disk for `rebuild_index`.
    fn cached_index(&self, owner_id: &str, slot: &mut OwnerSlot) -> Result<SaveIndex, SaveError> {
        if let Some(index) = &slot.index {
            return Ok(index.clone());
        }

        let index = match self.store.read_index(owner_id) {
            Ok(index) => index,
            Err(_e @ StoreError::Corrupted { .. }) => {
                warn!(owner = %owner_id, error = %_e, "index artifact corrupted, starting empty");
                let empty = SaveIndex::new();
                self.store.write_index(owner_id, &empty)?;
                empty
            }
            Err(e) => return Err(e.into()),
        };

        slot.index = Some(index.clone());
        Ok(index)
    }
}
