//! Application state management.

use std::sync::Arc;

use crate::service::SaveService;
use crate::session::SessionRegistry;
use crate::store::{FileStore, StoreError};

use super::config::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    service: Arc<SaveService>,
    sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Create state around an existing service and session registry.
    pub fn new(service: Arc<SaveService>, sessions: Arc<SessionRegistry>) -> Self {
        Self { service, sessions }
    }

    /// Create a new AppState from configuration.
    pub fn from_config(config: &Config) -> Result<Self, StateError> {
        let store = FileStore::open(&config.storage.path).map_err(|e| StateError::OpenStore {
            path: config.storage.path.clone(),
            source: e,
        })?;

        Ok(Self::new(
            Arc::new(SaveService::new(Arc::new(store))),
            Arc::new(SessionRegistry::new()),
        ))
    }

    pub fn service(&self) -> &SaveService {
        &self.service
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }
}

/// Errors that can occur when setting up application state.
#[derive(Debug)]
pub enum StateError {
    /// Failed to open the save store.
    OpenStore { path: String, source: StoreError },
}

impl std::fmt::Display for StateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateError::OpenStore { path, source } => {
                write!(f, "Failed to open save store at '{}': {}", path, source)
            }
        }
    }
}

impl std::error::Error for StateError {}
