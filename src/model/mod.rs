//! Save record model.
//!
//! A [`SaveRecord`] is one saved game: who owns it, when it was taken and
//! deep copies of the player entity and the world around it. Summaries of
//! records ([`SaveSummary`]) are what indexes and listings work with.

mod record;
mod snapshot;
mod summary;

pub use record::{RecordError, SaveRecord, default_save_name};
pub use snapshot::{CharacterSnapshot, CombatState, LiveGame, WorldSnapshot};
pub use summary::{SaveSummary, StorageLocation};
