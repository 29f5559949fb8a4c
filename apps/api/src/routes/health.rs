use axum::Json;
use serde_json::{json, Value};

/// GET /
/// Service descriptor for humans poking at the root URL.
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "service": "Calendar Sync & Reminder Agent",
        "status": "active",
        "data_source": "Luma (live)",
        "endpoints": [
            "/api/sync",
            "/api/remind",
            "/api/updates",
            "/api/digest",
            "/api/demo",
            "/api/stats"
        ]
    }))
}

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
