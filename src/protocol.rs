//! Message contract between a transport adapter and the save service.
//!
//! Messages are JSON objects tagged `{"type": ..., "data": ...}`, the same
//! envelope the game client uses for the rest of its traffic. Any
//! transport (WebSocket, HTTP, in-process) can feed [`ClientMessage`]s to
//! [`dispatch`] and forward the resulting [`ServerMessage`]s.

use serde::{Deserialize, Serialize};

use crate::logging::debug;
use crate::model::{CharacterSnapshot, LiveGame, SaveSummary, WorldSnapshot};
use crate::service::{SaveError, SaveService};
use crate::session::SessionRegistry;

/// Save-related requests from a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    SaveGame {
        #[serde(default)]
        save_name: Option<String>,
    },
    LoadGame {
        save_id: String,
    },
    GetSaves,
    DeleteSave {
        save_id: String,
    },
}

/// Machine-stable error code plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl From<&SaveError> for ErrorInfo {
    fn from(err: &SaveError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Outcome of an operation that returns nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(err: &SaveError) -> Self {
        Self {
            success: false,
            error: Some(err.into()),
        }
    }
}

/// Outcome of `save_game`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_summary: Option<SaveSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

/// Full live state pushed after a successful load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStatePayload {
    pub player_character: CharacterSnapshot,
    pub world: WorldSnapshot,
}

impl From<LiveGame> for GameStatePayload {
    fn from(game: LiveGame) -> Self {
        Self {
            player_character: game.character,
            world: game.world,
        }
    }
}

/// Messages sent back to the requesting client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    SaveResult(SaveResult),
    LoadResult(Ack),
    SavesList {
        saves: Vec<SaveSummary>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<ErrorInfo>,
    },
    DeleteResult(Ack),
    GameState(GameStatePayload),
}

/// Handle one client message for `owner_id`.
///
/// Live state is only replaced after a load has fully succeeded, and the
/// new state is pushed right after the `load_result`.
pub fn dispatch(
    service: &SaveService,
    sessions: &SessionRegistry,
    owner_id: &str,
    message: ClientMessage,
) -> Vec<ServerMessage> {
    debug!(owner = %owner_id, message = ?message, "dispatching save message");

    match message {
        ClientMessage::SaveGame { save_name } => {
            let live = sessions.get(owner_id);
            let result = match service.create_save(owner_id, live.as_ref(), save_name.as_deref()) {
                Ok(summary) => SaveResult {
                    success: true,
                    save_summary: Some(summary),
                    error: None,
                },
                Err(e) => SaveResult {
                    success: false,
                    save_summary: None,
                    error: Some((&e).into()),
                },
            };
            vec![ServerMessage::SaveResult(result)]
        }
        ClientMessage::LoadGame { save_id } => match service.load_save(owner_id, &save_id) {
            Ok(record) => {
                let game = sessions.apply_record(&record);
                vec![
                    ServerMessage::LoadResult(Ack::ok()),
                    ServerMessage::GameState(game.into()),
                ]
            }
            Err(e) => vec![ServerMessage::LoadResult(Ack::failed(&e))],
        },
        ClientMessage::GetSaves => match service.list_saves(owner_id) {
            Ok(saves) => vec![ServerMessage::SavesList { saves, error: None }],
            Err(e) => vec![ServerMessage::SavesList {
                saves: Vec::new(),
                error: Some((&e).into()),
            }],
        },
        ClientMessage::DeleteSave { save_id } => {
            let ack = match service.delete_save(owner_id, &save_id) {
                Ok(true) => Ack::ok(),
                Ok(false) => Ack::failed(&SaveError::SaveNotFound(save_id)),
                Err(e) => Ack::failed(&e),
            };
            vec![ServerMessage::DeleteResult(ack)]
        }
    }
}
