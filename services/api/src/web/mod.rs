pub mod rest;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::web::state::AppState;

// Re-export the handlers to make them easily accessible to the binaries.
pub use rest::{
    create_attempt_handler, create_round_handler, get_round_handler, list_attempts_handler,
    list_rounds_handler,
};

/// Builds the `/api` router over the shared state.
///
/// Cross-origin requests are allowed from any origin.
pub fn api_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/rounds",
            get(list_rounds_handler).post(create_round_handler),
        )
        .route("/api/rounds/{id}", get(get_round_handler))
        .route("/api/rounds/{id}/attempts", get(list_attempts_handler))
        .route("/api/attempts", post(create_attempt_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
