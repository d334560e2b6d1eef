//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use ear_trainer_core::ports::TelemetryStore;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn TelemetryStore>,
    pub config: Arc<Config>,
}
