//! Save service error taxonomy.

use thiserror::Error;

use crate::model::RecordError;
use crate::store::StoreError;

/// Errors reported by the save service.
///
/// Store-level failures are folded into this taxonomy; nothing lower-level
/// escapes to a transport.
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Owner '{0}' has no active character to save")]
    NoActiveCharacter(String),

    #[error("Save '{0}' not found")]
    SaveNotFound(String),

    #[error("Save '{save_id}' is corrupted: {reason}")]
    SaveCorrupted { save_id: String, reason: String },

    #[error("Invalid save format: {0}")]
    InvalidFormat(String),

    #[error("Invalid owner identifier: {0:?}")]
    InvalidOwner(String),

    #[error("Save storage unavailable: {0}")]
    StoreUnavailable(String),
}

impl SaveError {
    /// Short machine-stable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoActiveCharacter(_) => "NO_ACTIVE_CHARACTER",
            Self::SaveNotFound(_) => "SAVE_NOT_FOUND",
            Self::SaveCorrupted { .. } => "SAVE_CORRUPTED",
            Self::InvalidFormat(_) => "INVALID_FORMAT",
            Self::InvalidOwner(_) => "INVALID_OWNER",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }

    /// Map a store error raised while working on `save_id`.
    pub(crate) fn from_store(err: StoreError, save_id: &str) -> Self {
        match err {
            StoreError::NotFound { save_id, .. } => Self::SaveNotFound(save_id),
            StoreError::Corrupted { reason, .. } => Self::SaveCorrupted {
                save_id: save_id.to_string(),
                reason,
            },
            StoreError::InvalidKey { kind: "owner", key } => Self::InvalidOwner(key),
            // An id that cannot name a file cannot name a save either.
            StoreError::InvalidKey { key, .. } => Self::SaveNotFound(key),
            StoreError::Unavailable(e) => Self::StoreUnavailable(e.to_string()),
            StoreError::Encode(msg) => Self::StoreUnavailable(msg),
        }
    }
}

impl From<StoreError> for SaveError {
    fn from(err: StoreError) -> Self {
        Self::from_store(err, "")
    }
}

impl From<RecordError> for SaveError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Encode(msg) => Self::StoreUnavailable(msg),
            other => Self::InvalidFormat(other.to_string()),
        }
    }
}
