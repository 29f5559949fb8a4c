use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/sync
/// Triggers a scrape and reports what came back. The source label tells
/// callers whether they got live data or the placeholder set.
pub async fn handle_sync(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let fetched = state.events.fetch_all().await;

    Ok(Json(json!({
        "status": "success",
        "total_events": fetched.events.len(),
        "events_fetched": fetched.events.len(),
        "source": fetched.source.label(),
        "timestamp": Utc::now(),
    })))
}

/// GET /api/stats
pub async fn handle_stats(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let stats = state.events.stats().await;
    let reminders_sent_total = state.tracker.lock().await.sent_count();

    Ok(Json(json!({
        "status": "success",
        "statistics": {
            "total_events": stats.total_events,
            "upcoming_events": stats.upcoming_events,
            "past_events": stats.past_events,
            "reminders_sent_total": reminders_sent_total,
            "data_source": stats.data_source,
        },
        "next_event": stats.next_event,
        "timestamp": Utc::now(),
    })))
}
