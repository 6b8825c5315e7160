//! Durable storage for save records and per-owner indexes.
//!
//! [`SaveStore`] is the seam between the save service and the medium that
//! holds its data. [`FileStore`] keeps everything as JSON files under one
//! root directory.

mod error;
mod file;

pub use error::StoreError;
pub use file::FileStore;

use crate::index::SaveIndex;
use crate::model::SaveRecord;

/// Longest accepted owner or save identifier.
pub const MAX_KEY_LEN: usize = 128;

/// Durable key-value mapping from `(owner_id, save_id)` to records, plus one
/// index per owner.
///
/// Implementations never return data belonging to an owner other than the
/// one asked for. A write fully replaces the previous value for its key or
/// fails leaving it intact.
pub trait SaveStore: Send + Sync {
    /// Write (or replace) a record under `(record.owner_id, record.save_id)`.
    fn write_record(&self, record: &SaveRecord) -> Result<(), StoreError>;

    /// Read a record. `NotFound` if it was never written or was deleted,
    /// `Corrupted` if its bytes do not parse.
    fn read_record(&self, owner_id: &str, save_id: &str) -> Result<SaveRecord, StoreError>;

    /// Whether a record artifact exists, without parsing it.
    fn record_exists(&self, owner_id: &str, save_id: &str) -> Result<bool, StoreError>;

    /// Delete a record. Returns `false` if there was nothing to delete.
    fn delete_record(&self, owner_id: &str, save_id: &str) -> Result<bool, StoreError>;

    /// Ids of every record artifact stored for `owner_id`.
    fn list_record_ids(&self, owner_id: &str) -> Result<Vec<String>, StoreError>;

    /// Read an owner's index. An owner without one gets an empty index;
    /// an unparsable artifact is `Corrupted`.
    fn read_index(&self, owner_id: &str) -> Result<SaveIndex, StoreError>;

    /// Replace an owner's index.
    fn write_index(&self, owner_id: &str, index: &SaveIndex) -> Result<(), StoreError>;
}

/// Check that an identifier can be used as a single path component.
///
/// Accepts ASCII letters, digits, `-`, `_`, `.` and `@`, not starting with
/// a dot.
pub fn validate_key(kind: &'static str, key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'));

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey {
            kind,
            key: key.to_string(),
        })
    }
}
