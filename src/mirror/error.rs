//! Error types for the client mirror.

use thiserror::Error;

/// Errors that can occur during mirror operations.
#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("Mirror not initialized at {0}")]
    NotInitialized(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Save not found in local mirror: {0}")]
    NotFound(String),

    #[error("Local entry for save '{save_id}' is corrupted: {reason}")]
    Corrupted { save_id: String, reason: String },

    #[error("Failed to encode entry: {0}")]
    Encode(String),
}

impl MirrorError {
    /// Short machine-stable code, matching the server's codes where the
    /// meaning is shared.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat(_) => "INVALID_FORMAT",
            Self::NotFound(_) => "SAVE_NOT_FOUND",
            Self::Corrupted { .. } => "SAVE_CORRUPTED",
            Self::Io(_) | Self::Fjall(_) | Self::NotInitialized(_) | Self::Encode(_) => {
                "STORE_UNAVAILABLE"
            }
        }
    }
}
