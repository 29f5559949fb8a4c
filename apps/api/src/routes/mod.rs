pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::events::handlers as event_handlers;
use crate::remind::handlers as remind_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .route("/api/sync", post(event_handlers::handle_sync))
        .route("/api/remind", post(remind_handlers::handle_remind))
        .route("/api/updates", post(remind_handlers::handle_updates))
        .route("/api/digest", post(remind_handlers::handle_digest))
        .route("/api/demo", post(remind_handlers::handle_demo))
        .route("/api/stats", get(event_handlers::handle_stats))
        .with_state(state)
}
