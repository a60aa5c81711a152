pub mod ask;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// All API routes, with state attached.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(ask::health))
        .route("/api/status", get(ask::status))
        .route("/api/ask", post(ask::ask))
        .with_state(state)
}
