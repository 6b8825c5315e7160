//! API routes and handlers.

mod messages;
mod saves;
mod session;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Serialize;

use super::state::AppState;

/// Build the API router.
pub fn router(state: AppState) -> Router {
    let owner_routes = Router::new()
        // Save operations
        .route("/saves", get(saves::list_saves).post(saves::create_save))
        .route("/saves/reindex", post(saves::reindex))
        .route(
            "/saves/{save_id}",
            get(saves::export_save).delete(saves::delete_save),
        )
        .route("/saves/{save_id}/load", post(saves::load_save))
        // Live game stand-in
        .route(
            "/session",
            get(session::get_session).put(session::put_session),
        )
        // Message contract
        .route("/messages", post(messages::dispatch_message));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/owners/{owner}", owner_routes)
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Body of a successful operation that returns nothing else.
#[derive(Debug, Serialize)]
pub struct Success {
    pub success: bool,
}

impl Success {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
