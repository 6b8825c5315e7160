//! Message contract over HTTP.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use tracing::{debug, instrument};

use crate::protocol::{self, ClientMessage, ServerMessage};

use super::super::{error::ApiError, state::AppState};

/// Dispatch one client message and return every outgoing message.
#[instrument(skip_all, fields(owner = %owner))]
pub async fn dispatch_message(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    body: Result<Json<ClientMessage>, JsonRejection>,
) -> Result<Json<Vec<ServerMessage>>, ApiError> {
    let Json(message) = body?;
    let replies = protocol::dispatch(state.service(), state.sessions(), &owner, message);
    debug!(replies = replies.len(), "message dispatched");
    Ok(Json(replies))
}
