//! Convenient re-exports for common usage patterns.
//!
//! # Example
//!
//! ```ignore
//! use savekeep::prelude::*;
//!
//! let mirror = ClientMirror::open_or_init(".savekeep-mirror")?;
//! for summary in mirror.list_local()? {
//!     println!("{} {}", summary.save_id, summary.save_name);
//! }
//! ```

// Unified error handling
pub use crate::error::{Error, Result};

// Records and indexes
pub use crate::index::SaveIndex;
pub use crate::model::{
    CharacterSnapshot, CombatState, LiveGame, SaveRecord, SaveSummary, StorageLocation,
    WorldSnapshot,
};

// Server-side persistence
pub use crate::service::{SaveError, SaveService};
pub use crate::session::{LiveSource, SessionRegistry};
pub use crate::store::{FileStore, SaveStore};

// Client mirror (requires "mirror" feature)
#[cfg(feature = "mirror")]
pub use crate::mirror::{ClientMirror, MirrorError};

// Auto-save (requires "autosave" feature)
#[cfg(feature = "autosave")]
pub use crate::autosave::{AutoSaver, LocalSaves, RemoteSaves};
