use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::remind::dispatch::{
    run_demo, run_digest, run_reminder_pass, run_update_pass, DemoOutcome, DigestOutcome,
};
use crate::remind::windows::reminder_windows;
use crate::state::AppState;

/// POST /api/remind
/// Runs one due-reminder pass. The tracker lock is held across the whole
/// pass so overlapping triggers cannot double-send.
pub async fn handle_remind(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let upcoming = state.events.upcoming().await;
    let mut tracker = state.tracker.lock().await;

    let run = run_reminder_pass(
        &upcoming,
        &reminder_windows(),
        &mut tracker,
        &state.summarizer,
        state.sms.as_ref(),
        Utc::now(),
    )
    .await;

    Ok(Json(json!({
        "status": "success",
        "reminders_sent": run.sent.len(),
        "details": run.sent,
        "skipped_already_sent": run.skipped_already_sent,
        "failed": run.failed,
        "timestamp": Utc::now(),
    })))
}

/// POST /api/updates
/// Sends one batched update about today's events per wall-clock bucket.
pub async fn handle_updates(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let upcoming = state.events.upcoming().await;
    let mut tracker = state.tracker.lock().await;

    let run = run_update_pass(&upcoming, &mut tracker, state.sms.as_ref(), Utc::now()).await;

    Ok(Json(json!({
        "status": "success",
        "update_sent": run.update_sent,
        "events_today": run.events_today,
        "message_id": run.message_id,
        "quota_remaining": run.quota_remaining,
        "reason": run.reason,
        "timestamp": Utc::now(),
    })))
}

/// POST /api/digest
/// Composes and sends a weekly digest over all upcoming events.
pub async fn handle_digest(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let upcoming = state.events.upcoming().await;

    let body = match run_digest(&upcoming, &state.summarizer, state.sms.as_ref()).await {
        DigestOutcome::NoEvents => json!({
            "status": "no_events",
            "message": "No upcoming events to include in digest",
            "timestamp": Utc::now(),
        }),
        DigestOutcome::Sent {
            events_included,
            message_id,
            ai_generated,
            tokens_used,
            service,
            quota_remaining,
        } => json!({
            "status": "success",
            "events_included": events_included,
            "message_id": message_id,
            "ai_generated": ai_generated,
            "tokens_used": tokens_used,
            "service": service,
            "quota_remaining": quota_remaining,
            "timestamp": Utc::now(),
        }),
        DigestOutcome::Failed { error } => json!({
            "status": "failed",
            "error": error,
            "timestamp": Utc::now(),
        }),
    };

    Ok(Json(body))
}

/// POST /api/demo
/// Sends a message about the next event regardless of timing, for
/// integration verification.
pub async fn handle_demo(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let upcoming = state.events.upcoming().await;

    let body = match run_demo(&upcoming, state.sms.as_ref()).await {
        DemoOutcome::Sent {
            events_found,
            message_id,
            service,
            quota_remaining,
        } => json!({
            "status": "demo_success",
            "message_sent": true,
            "events_found": events_found,
            "message_id": message_id,
            "service": service,
            "quota_remaining": quota_remaining,
            "timestamp": Utc::now(),
        }),
        DemoOutcome::Failed { events_found, error } => json!({
            "status": "demo_failed",
            "message_sent": false,
            "events_found": events_found,
            "error": error,
            "timestamp": Utc::now(),
        }),
    };

    Ok(Json(body))
}
