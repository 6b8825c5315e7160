//! Save-game persistence for a browser-based text RPG.
//!
//! savekeep captures a player's character and world state into durable,
//! per-owner save records, keeps a per-owner index of save summaries, and
//! mirrors saves into an offline client-side store that supports import
//! and export.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use savekeep::prelude::*;
//!
//! let store = FileStore::open(".savekeep")?;
//! let service = SaveService::new(Arc::new(store));
//!
//! let summary = service.create_save("u1", Some(&live_game), Some("Dawn"))?;
//! let record = service.load_save("u1", &summary.save_id)?;
//! ```
//!
//! # Modules
//!
//! - [`model`] - Save records and the character/world snapshots inside them
//! - [`index`] - Per-owner index of save summaries
//! - [`store`] - Durable, owner-scoped record storage
//! - [`service`] - Create, list, load and delete with index reconciliation
//! - [`protocol`] - Client/server message contract
//! - [`mirror`] - Offline client mirror backed by fjall (requires `mirror` feature)
//! - [`autosave`] - Fixed-interval dual-write auto-save (requires `autosave` feature)
//! - [`server`] - HTTP API (requires `server` feature)
//!
//! # Feature Flags
//!
//! - `mirror` - Enable the client mirror (enabled by default)
//! - `autosave` - Enable the auto-saver (enabled by default)
//! - `logging` - Enable library-level tracing (consumers provide their own subscriber)
//! - `cli` - Enable the command-line interface binary
//! - `server` - Enable the HTTP API server (enabled by default)
//! - `full` - Enable all features

mod logging;

#[cfg(feature = "autosave")]
pub mod autosave;
pub mod index;
mod locks;
#[cfg(feature = "mirror")]
pub mod mirror;
pub mod model;
pub mod prelude;
pub mod protocol;
#[cfg(feature = "server")]
pub mod server;
pub mod service;
pub mod session;
pub mod store;

mod error;

// Re-export the unified error type
pub use error::{Error, Result};

// Re-export core types at crate root for convenience
pub use index::SaveIndex;
pub use model::{
    CharacterSnapshot, CombatState, LiveGame, RecordError, SaveRecord, SaveSummary,
    StorageLocation, WorldSnapshot,
};
pub use protocol::{ClientMessage, ServerMessage, dispatch};
pub use service::{SaveError, SaveService};
pub use session::{LiveSource, SessionRegistry};
pub use store::{FileStore, SaveStore, StoreError};

#[cfg(feature = "mirror")]
pub use mirror::{ClientMirror, MirrorError};

#[cfg(feature = "autosave")]
pub use autosave::{AutoSaveOutcome, AutoSaver, LocalSaves, RemoteSaves};
