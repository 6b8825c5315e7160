//! HTTP API server for savekeep.
//!
//! An axum adapter over the save service and the message contract in
//! [`crate::protocol`]. Every route is scoped to one owner under
//! `/api/v1/owners/{owner}`.

mod config;
mod error;
mod logging;
mod routes;
mod state;

pub use config::{Config, CorsConfig, LogFormat, LoggingConfig, ServerConfig, StorageConfig};
pub use error::ApiError;
pub use logging::{LoggingError, init as init_logging};
pub use routes::router;
pub use state::{AppState, StateError};
