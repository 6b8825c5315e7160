//! Unified error type for the savekeep library.
//!
//! Each module has its own error enum; [`Error`] wraps them so application
//! code can use a single error type.

use thiserror::Error;

#[cfg(feature = "mirror")]
use crate::mirror::MirrorError;
use crate::model::RecordError;
use crate::service::SaveError;
use crate::store::StoreError;

/// Unified error type for all savekeep operations.
///
/// # Example
///
/// ```ignore
/// use savekeep::{FileStore, Result};
///
/// fn open_store() -> Result<FileStore> {
///     Ok(FileStore::open(".savekeep")?)
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A save record failed to decode or validate.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Error from the persistence store.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Error from the save/load service.
    #[error(transparent)]
    Save(#[from] SaveError),

    /// Error from the client mirror.
    #[cfg(feature = "mirror")]
    #[error(transparent)]
    Mirror(#[from] MirrorError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A [`Result`] type alias using the unified [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Machine-stable code for this error, as sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Record(_) => "INVALID_FORMAT",
            Self::Store(e) => e.code(),
            Self::Save(e) => e.code(),
            #[cfg(feature = "mirror")]
            Self::Mirror(e) => e.code(),
            Self::Io(_) => "STORE_UNAVAILABLE",
        }
    }

    /// Returns `true` if this is a save service error.
    pub fn is_save(&self) -> bool {
        matches!(self, Self::Save(_))
    }

    /// Returns `true` if this is a client mirror error.
    #[cfg(feature = "mirror")]
    pub fn is_mirror(&self) -> bool {
        matches!(self, Self::Mirror(_))
    }
}
