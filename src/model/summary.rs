//! Index-level view of a save.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which store a summary describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageLocation {
    /// The server-side persistence store.
    Server,
    /// The client's local mirror.
    Local,
}

/// What a save listing shows without reading the full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveSummary {
    pub save_id: String,
    pub save_name: String,
    pub timestamp: DateTime<Utc>,
    pub character_name: String,
    pub character_level: u32,
    pub character_class: String,
    pub storage_location: StorageLocation,
}
