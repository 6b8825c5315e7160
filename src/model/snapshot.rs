//! Player and world snapshots.
//!
//! Every entity carries an explicit `FIELDS` list. When a snapshot is read
//! back from JSON, keys outside that list are dropped and logged instead of
//! being applied to live state.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::logging::warn;

/// Starting location of a freshly created character.
pub const START_LOCATION: &str = "town_square";

/// Serialized player entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterSnapshot {
    pub id: String,
    /// Empty while character creation is still in progress.
    pub name: String,
    pub race: String,
    pub class_name: String,
    pub level: u32,
    pub hp: i32,
    pub max_hp: i32,
    pub ac: i32,
    pub strength: u8,
    pub dexterity: u8,
    pub constitution: u8,
    pub intelligence: u8,
    pub wisdom: u8,
    pub charisma: u8,
    pub inventory: Vec<String>,
    /// Spells a caster can cast. Each entry is schema-open (`id`, `name`,
    /// `level`, `type`, plus dice fields that vary by spell type).
    pub known_spells: Vec<Value>,
    /// Remaining spell slots keyed by spell level (`"1"`, `"2"`, ...).
    pub spell_slots: BTreeMap<String, u32>,
}

impl CharacterSnapshot {
    /// Version 1 field list.
    pub const FIELDS: &'static [&'static str] = &[
        "id",
        "name",
        "race",
        "class_name",
        "level",
        "hp",
        "max_hp",
        "ac",
        "strength",
        "dexterity",
        "constitution",
        "intelligence",
        "wisdom",
        "charisma",
        "inventory",
        "known_spells",
        "spell_slots",
    ];

    /// A level 1 character with average scores and no name yet.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Whether character creation has finished.
    pub fn is_created(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

impl Default for CharacterSnapshot {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            race: String::new(),
            class_name: String::new(),
            level: 1,
            hp: 10,
            max_hp: 10,
            ac: 10,
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
            inventory: Vec::new(),
            known_spells: Vec::new(),
            spell_slots: BTreeMap::new(),
        }
    }
}

/// Encounter state while a fight is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatState {
    pub id: String,
    pub location_id: String,
    #[serde(default = "first_round")]
    pub round: u32,
    #[serde(default)]
    pub current_turn: String,
    #[serde(default)]
    pub initiative_order: Vec<String>,
}

fn first_round() -> u32 {
    1
}

impl CombatState {
    pub const FIELDS: &'static [&'static str] =
        &["id", "location_id", "round", "current_turn", "initiative_order"];
}

/// Serialized world state around the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSnapshot {
    pub current_location_id: String,
    pub in_combat: bool,
    pub combat: Option<CombatState>,
    pub visited_locations: BTreeSet<String>,
    /// Quest progress and story flags. Schema-open.
    pub flags: BTreeMap<String, Value>,
}

impl WorldSnapshot {
    /// Version 1 field list.
    pub const FIELDS: &'static [&'static str] = &[
        "current_location_id",
        "in_combat",
        "combat",
        "visited_locations",
        "flags",
    ];
}

impl Default for WorldSnapshot {
    fn default() -> Self {
        let mut visited_locations = BTreeSet::new();
        visited_locations.insert(START_LOCATION.to_string());
        Self {
            current_location_id: START_LOCATION.to_string(),
            in_combat: false,
            combat: None,
            visited_locations,
            flags: BTreeMap::new(),
        }
    }
}

/// Live state of one owner's game, as held by the game engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveGame {
    pub character: CharacterSnapshot,
    pub world: WorldSnapshot,
}

impl LiveGame {
    pub fn new(character: CharacterSnapshot, world: WorldSnapshot) -> Self {
        Self { character, world }
    }
}

/// Drop keys that are not part of `known`, logging each one.
///
/// Returns the dropped key names.
pub(crate) fn strip_unknown_fields(
    entity: &str,
    object: &mut Map<String, Value>,
    known: &[&str],
) -> Vec<String> {
    let unknown: Vec<String> = object
        .keys()
        .filter(|k| !known.contains(&k.as_str()))
        .cloned()
        .collect();

    for key in &unknown {
        warn!(entity = entity, field = %key, "ignoring unknown field");
        object.remove(key);
    }

    unknown
}

/// Strip unknown fields from a raw character object.
pub(crate) fn sanitize_character(object: &mut Map<String, Value>) -> Vec<String> {
    strip_unknown_fields("character", object, CharacterSnapshot::FIELDS)
}

/// Strip unknown fields from a raw world object, including its combat state.
pub(crate) fn sanitize_world(object: &mut Map<String, Value>) -> Vec<String> {
    let mut dropped = strip_unknown_fields("world", object, WorldSnapshot::FIELDS);
    if let Some(Value::Object(combat)) = object.get_mut("combat") {
        dropped.extend(strip_unknown_fields("combat", combat, CombatState::FIELDS));
    }
    dropped
}
