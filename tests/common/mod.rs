//! Common test utilities and fixtures.
//!
//! Shared builders for live games and save documents, plus a test
//! application wrapping the HTTP router over a temporary store.

#![allow(dead_code)]

use std::sync::Arc;

use savekeep::{CharacterSnapshot, CombatState, FileStore, LiveGame, SaveService, WorldSnapshot};
use serde_json::{Value, json};
use tempfile::TempDir;

// =============================================================================
// Live Game Fixtures
// =============================================================================

/// A finished level-`level` character named `name`.
pub fn character(owner_id: &str, name: &str, level: u32) -> CharacterSnapshot {
    let mut character = CharacterSnapshot::new(owner_id);
    character.name = name.to_string();
    character.race = "Elf".to_string();
    character.class_name = "Ranger".to_string();
    character.level = level;
    character.hp = 14;
    character.max_hp = 18;
    character.ac = 14;
    character.dexterity = 16;
    character.inventory = vec!["Longbow".to_string(), "Rope".to_string()];
    character
}

/// A live game at the tavern with one quest flag set.
pub fn live_game(owner_id: &str, name: &str) -> LiveGame {
    let mut world = WorldSnapshot::default();
    world.current_location_id = "tavern".to_string();
    world.visited_locations.insert("tavern".to_string());
    world
        .flags
        .insert("quest.rats".to_string(), json!({"stage": 2}));
    LiveGame::new(character(owner_id, name, 3), world)
}

/// A live game paused mid-combat.
pub fn live_game_in_combat(owner_id: &str, name: &str) -> LiveGame {
    let mut game = live_game(owner_id, name);
    game.world.in_combat = true;
    game.world.combat = Some(CombatState {
        id: "c1".to_string(),
        location_id: "tavern".to_string(),
        round: 3,
        current_turn: owner_id.to_string(),
        initiative_order: vec![owner_id.to_string(), "goblin_1".to_string()],
    });
    game
}

/// A standalone save document as a client would export it.
pub fn save_document(save_id: &str, owner_id: &str, name: &str) -> Value {
    json!({
        "save_id": save_id,
        "save_name": format!("{}'s Journey", name),
        "timestamp": "2026-10-01T12:00:00Z",
        "owner_id": owner_id,
        "character_snapshot": {
            "id": owner_id,
            "name": name,
            "race": "Dwarf",
            "class_name": "Cleric",
            "level": 4,
            "hp": 20,
            "max_hp": 27,
            "ac": 16,
            "inventory": ["Mace"]
        },
        "world_snapshot": {
            "current_location_id": "temple",
            "in_combat": false,
            "combat": null,
            "visited_locations": ["town_square", "temple"],
            "flags": {}
        }
    })
}

// =============================================================================
// Service Fixture
// =============================================================================

/// A save service over a fresh temporary file store.
pub struct TestService {
    pub service: SaveService,
    pub store: Arc<FileStore>,
    pub temp_dir: TempDir,
}

impl TestService {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = TempDir::new()?;
        let store = Arc::new(FileStore::open(temp_dir.path().join("store"))?);
        let service = SaveService::new(store.clone());
        Ok(Self {
            service,
            store,
            temp_dir,
        })
    }

    /// Directory holding an owner's record artifacts.
    pub fn saves_dir(&self, owner_id: &str) -> std::path::PathBuf {
        self.store.root().join("owners").join(owner_id).join("saves")
    }

    /// Path of an owner's index artifact.
    pub fn index_path(&self, owner_id: &str) -> std::path::PathBuf {
        self.store.root().join("owners").join(owner_id).join("index.json")
    }
}

// =============================================================================
// Test Application
// =============================================================================

#[cfg(feature = "server")]
pub use app::TestApp;

#[cfg(feature = "server")]
mod app {
    use axum_test::TestServer;
    use savekeep::server::{
        AppState, Config, CorsConfig, LoggingConfig, ServerConfig, StorageConfig, router,
    };
    use tempfile::TempDir;

    /// Test application wrapper that manages a temporary store.
    pub struct TestApp {
        pub server: TestServer,
        _temp_dir: TempDir, // Keep alive for test duration
    }

    impl TestApp {
        /// Create a new test application with a fresh temporary store.
        pub fn new() -> anyhow::Result<Self> {
            let temp_dir = TempDir::new()?;
            let store_path = temp_dir.path().join("store");
            let config = Config {
                server: ServerConfig {
                    bind: "127.0.0.1".into(),
                    port: 0,
                    static_path: None,
                },
                storage: StorageConfig {
                    path: store_path.to_string_lossy().into(),
                },
                cors: CorsConfig::default(),
                logging: LoggingConfig::default(),
            };
            let state = AppState::from_config(&config)?;
            let server = TestServer::new(router(state))?;
            Ok(Self {
                server,
                _temp_dir: temp_dir,
            })
        }

        /// Install a live game for `owner`.
        pub async fn start_game(&self, owner: &str, game: &savekeep::LiveGame) {
            self.server
                .put(&format!("/api/v1/owners/{}/session", owner))
                .json(game)
                .await
                .assert_status_ok();
        }

        /// Create a save and return its id.
        pub async fn save(&self, owner: &str, save_name: Option<&str>) -> anyhow::Result<String> {
            let response = self
                .server
                .post(&format!("/api/v1/owners/{}/saves", owner))
                .json(&serde_json::json!({ "save_name": save_name }))
                .await;
            response.assert_status(axum::http::StatusCode::CREATED);
            let body: serde_json::Value = response.json();
            body["save_summary"]["save_id"]
                .as_str()
                .map(String::from)
                .ok_or_else(|| anyhow::anyhow!("no save_id in {}", body))
        }

        /// List save names for `owner`, in listing order.
        pub async fn save_names(&self, owner: &str) -> Vec<String> {
            let body: serde_json::Value = self
                .server
                .get(&format!("/api/v1/owners/{}/saves", owner))
                .await
                .json();
            body["saves"]
                .as_array()
                .map(|saves| {
                    saves
                        .iter()
                        .filter_map(|s| s["save_name"].as_str().map(String::from))
                        .collect()
                })
                .unwrap_or_default()
        }
    }
}
