//! Save operation handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::model::{SaveRecord, SaveSummary};

use super::super::{error::ApiError, state::AppState};
use super::Success;

/// Request body for creating a save.
#[derive(Debug, Deserialize, Default)]
pub struct CreateSaveRequest {
    #[serde(default)]
    pub save_name: Option<String>,
}

/// Response for a created save.
#[derive(Debug, Serialize)]
pub struct CreateSaveResponse {
    pub success: bool,
    pub save_summary: SaveSummary,
}

/// Response listing an owner's saves.
#[derive(Debug, Serialize)]
pub struct SavesResponse {
    pub saves: Vec<SaveSummary>,
}

/// List an owner's saves, newest first.
#[instrument(skip_all, fields(owner = %owner))]
pub async fn list_saves(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<Json<SavesResponse>, ApiError> {
    debug!("listing saves");
    let saves = state.service().list_saves(&owner)?;
    debug!(count = saves.len(), "listed saves");
    Ok(Json(SavesResponse { saves }))
}

/// Save the owner's live game.
///
/// The body is optional; an absent or empty body uses the default name.
#[instrument(skip_all, fields(owner = %owner))]
pub async fn create_save(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    body: Result<Json<CreateSaveRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateSaveResponse>), ApiError> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => CreateSaveRequest::default(),
        Err(rejection) => return Err(rejection.into()),
    };

    debug!(save_name = request.save_name.as_deref(), "creating save");
    let live = state.sessions().get(&owner);
    let save_summary =
        state
            .service()
            .create_save(&owner, live.as_ref(), request.save_name.as_deref())?;

    info!(save_id = %save_summary.save_id, name = %save_summary.save_name, "save created");
    Ok((
        StatusCode::CREATED,
        Json(CreateSaveResponse {
            success: true,
            save_summary,
        }),
    ))
}

/// Return a save as a standalone document.
#[instrument(skip_all, fields(owner = %owner, save_id = %save_id))]
pub async fn export_save(
    State(state): State<AppState>,
    Path((owner, save_id)): Path<(String, String)>,
) -> Result<Json<SaveRecord>, ApiError> {
    debug!("exporting save");
    let record = state.service().load_save(&owner, &save_id)?;
    Ok(Json(record))
}

/// Load a save into the owner's live game.
#[instrument(skip_all, fields(owner = %owner, save_id = %save_id))]
pub async fn load_save(
    State(state): State<AppState>,
    Path((owner, save_id)): Path<(String, String)>,
) -> Result<Json<Success>, ApiError> {
    debug!("loading save");
    let record = state.service().load_save(&owner, &save_id)?;
    state.sessions().apply_record(&record);
    info!(character = %record.character_snapshot.name, "save loaded into live game");
    Ok(Json(Success::ok()))
}

/// Delete a save.
#[instrument(skip_all, fields(owner = %owner, save_id = %save_id))]
pub async fn delete_save(
    State(state): State<AppState>,
    Path((owner, save_id)): Path<(String, String)>,
) -> Result<Json<Success>, ApiError> {
    debug!("deleting save");
    if state.service().delete_save(&owner, &save_id)? {
        info!("save deleted");
        Ok(Json(Success::ok()))
    } else {
        Err(ApiError::save_not_found(&owner, &save_id))
    }
}

/// Rebuild the owner's index from the stored records.
#[instrument(skip_all, fields(owner = %owner))]
pub async fn reindex(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<Json<SavesResponse>, ApiError> {
    debug!("rebuilding index");
    let saves = state.service().rebuild_index(&owner)?;
    info!(entries = saves.len(), "index rebuilt");
    Ok(Json(SavesResponse { saves }))
}
