//! Error types for the persistence store.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Save '{save_id}' not found for owner '{owner_id}'")]
    NotFound { owner_id: String, save_id: String },

    #[error("Corrupted artifact at {location}: {reason}")]
    Corrupted {
        location: String,
        reason: String,
        /// Whether the save name and timestamp could still be read.
        metadata_intact: bool,
    },

    #[error("Invalid {kind} identifier: {key:?}")]
    InvalidKey { kind: &'static str, key: String },

    #[error("Store unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    #[error("Failed to encode artifact: {0}")]
    Encode(String),
}

impl StoreError {
    /// The client-facing code this error maps to.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "SAVE_NOT_FOUND",
            Self::Corrupted { .. } => "SAVE_CORRUPTED",
            Self::InvalidKey { kind: "owner", .. } => "INVALID_OWNER",
            Self::InvalidKey { .. } => "SAVE_NOT_FOUND",
            Self::Unavailable(_) | Self::Encode(_) => "STORE_UNAVAILABLE",
        }
    }
}
