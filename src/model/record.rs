//! The save record and its JSON document form.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use super::snapshot::{CharacterSnapshot, LiveGame, WorldSnapshot, sanitize_character, sanitize_world};
use super::summary::{SaveSummary, StorageLocation};
use crate::logging::warn;

/// Errors produced while reading or writing a save record document.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Save document is not a JSON object")]
    NotAnObject,

    #[error("Malformed save document: {0}")]
    Malformed(String),

    #[error("Failed to encode save record: {0}")]
    Encode(String),
}

/// One saved game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    #[serde(default = "current_format_version")]
    pub format_version: u32,
    pub save_id: String,
    #[serde(default)]
    pub save_name: String,
    pub timestamp: DateTime<Utc>,
    pub owner_id: String,
    pub character_snapshot: CharacterSnapshot,
    pub world_snapshot: WorldSnapshot,
}

fn current_format_version() -> u32 {
    SaveRecord::FORMAT_VERSION
}

/// Name given to a save when the caller did not choose one.
pub fn default_save_name(character_name: &str) -> String {
    format!("{}'s Adventure", character_name)
}

impl SaveRecord {
    /// Current document format version.
    pub const FORMAT_VERSION: u32 = 1;

    /// Top-level fields of a version 1 document.
    pub const FIELDS: &'static [&'static str] = &[
        "format_version",
        "save_id",
        "save_name",
        "timestamp",
        "owner_id",
        "character_snapshot",
        "world_snapshot",
    ];

    /// Snapshot live state into a new record with a fresh random id.
    ///
    /// The snapshots are deep copies; later changes to `game` do not reach
    /// the record.
    pub fn capture(
        owner_id: &str,
        game: &LiveGame,
        save_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        let save_name = match save_name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_save_name(&game.character.name),
        };

        Self {
            format_version: Self::FORMAT_VERSION,
            save_id: Uuid::new_v4().to_string(),
            save_name,
            // Artifact names carry microseconds; keep the record in step.
            timestamp: now.trunc_subsecs(6),
            owner_id: owner_id.to_string(),
            character_snapshot: game.character.clone(),
            world_snapshot: game.world.clone(),
        }
    }

    /// Parse a record document.
    ///
    /// Accepts `player_data` / `game_state` as alternative names for the two
    /// snapshots. Unknown fields are dropped and logged.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, RecordError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| RecordError::Malformed(e.to_string()))?;
        let Value::Object(mut object) = value else {
            return Err(RecordError::NotAnObject);
        };

        require(&object, "save_id")?;
        rename_alias(&mut object, "player_data", "character_snapshot");
        rename_alias(&mut object, "game_state", "world_snapshot");
        require(&object, "character_snapshot")?;
        require(&object, "world_snapshot")?;

        super::snapshot::strip_unknown_fields("save record", &mut object, Self::FIELDS);
        if let Some(Value::Object(character)) = object.get_mut("character_snapshot") {
            sanitize_character(character);
        }
        if let Some(Value::Object(world)) = object.get_mut("world_snapshot") {
            sanitize_world(world);
        }

        let mut record: SaveRecord = serde_json::from_value(Value::Object(object))
            .map_err(|e| RecordError::Malformed(e.to_string()))?;

        if record.format_version > Self::FORMAT_VERSION {
            warn!(
                save_id = %record.save_id,
                version = record.format_version,
                "save written by a newer format version"
            );
        }

        record.validate()?;
        if record.save_name.trim().is_empty() {
            record.save_name = default_save_name(&record.character_snapshot.name);
        }

        Ok(record)
    }

    /// Human-diffable document form.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>, RecordError> {
        serde_json::to_vec_pretty(self).map_err(|e| RecordError::Encode(e.to_string()))
    }

    /// Check the fields serde cannot check on its own.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.save_id.trim().is_empty() {
            return Err(RecordError::MissingField("save_id"));
        }
        if self.owner_id.trim().is_empty() {
            return Err(RecordError::MissingField("owner_id"));
        }
        if !self.character_snapshot.is_created() {
            return Err(RecordError::MissingField("character_snapshot.name"));
        }
        Ok(())
    }

    /// Summary of this record for an index.
    pub fn summary(&self, storage_location: StorageLocation) -> SaveSummary {
        SaveSummary {
            save_id: self.save_id.clone(),
            save_name: self.save_name.clone(),
            timestamp: self.timestamp,
            character_name: self.character_snapshot.name.clone(),
            character_level: self.character_snapshot.level,
            character_class: self.character_snapshot.class_name.clone(),
            storage_location,
        }
    }

    /// Keep the timestamp from moving backward relative to `previous`.
    pub fn clamp_timestamp(&mut self, previous: DateTime<Utc>) {
        if self.timestamp < previous {
            self.timestamp = previous;
        }
    }

    /// Live state restored from this record.
    pub fn to_live_game(&self) -> LiveGame {
        LiveGame::new(self.character_snapshot.clone(), self.world_snapshot.clone())
    }
}

fn require(object: &Map<String, Value>, field: &'static str) -> Result<(), RecordError> {
    match object.get(field) {
        Some(Value::Null) | None => Err(RecordError::MissingField(field)),
        Some(_) => Ok(()),
    }
}

fn rename_alias(object: &mut Map<String, Value>, alias: &str, canonical: &str) {
    if object.contains_key(canonical) {
        return;
    }
    if let Some(value) = object.remove(alias) {
        object.insert(canonical.to_string(), value);
    }
}
