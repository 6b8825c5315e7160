//! Live game handlers.
//!
//! These stand in for the game engine: they let a client (or a test) read
//! and replace the live game that saves are taken from.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use tracing::{debug, info, instrument};

use crate::model::LiveGame;
use crate::service::SaveError;
use crate::store::validate_key;

use super::super::{error::ApiError, state::AppState};
use super::Success;

/// Get the owner's live game.
#[instrument(skip_all, fields(owner = %owner))]
pub async fn get_session(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<Json<LiveGame>, ApiError> {
    state
        .sessions()
        .get(&owner)
        .map(Json)
        .ok_or_else(|| ApiError::session_not_found(&owner))
}

/// Replace the owner's live game.
#[instrument(skip_all, fields(owner = %owner))]
pub async fn put_session(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    body: Result<Json<LiveGame>, JsonRejection>,
) -> Result<Json<Success>, ApiError> {
    validate_key("owner", &owner).map_err(|_| SaveError::InvalidOwner(owner.clone()))?;
    let Json(game) = body?;

    debug!(character = %game.character.name, location = %game.world.current_location_id, "replacing live game");
    state.sessions().set(&owner, game);
    info!("live game replaced");
    Ok(Json(Success::ok()))
}
