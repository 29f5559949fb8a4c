//! Reminder window evaluation.
//!
//! The evaluator is polled every few minutes rather than run continuously,
//! so "due" is a 15-minute firing slot starting at `start_time - offset`,
//! not an instant match. Deduplication across polls is the tracker's job.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::events::model::Event;

/// Width of the firing slot. Must comfortably exceed the poll interval.
pub const FIRING_SLOT_MINUTES: i64 = 15;

/// A configured (time-before-event, label) pair.
#[derive(Debug, Clone)]
pub struct ReminderWindow {
    pub offset: Duration,
    pub label: &'static str,
}

/// The process-wide window configuration.
pub fn reminder_windows() -> [ReminderWindow; 3] {
    [
        ReminderWindow {
            offset: Duration::hours(24),
            label: "24_hours",
        },
        ReminderWindow {
            offset: Duration::hours(2),
            label: "2_hours",
        },
        ReminderWindow {
            offset: Duration::minutes(30),
            label: "30_minutes",
        },
    ]
}

/// An event paired with the window it is currently due for.
#[derive(Debug, Clone, Serialize)]
pub struct DueReminder {
    pub event: Event,
    pub reminder_type: String,
    /// Dedup identity: `{event.id}_{reminder_type}`.
    pub reminder_key: String,
}

/// Computes the exact set of (event, window) pairs due at `now`.
///
/// Due iff `now ∈ [start - offset, start - offset + slot)`. Pure in its
/// inputs: identical (events, windows, now) always produce identical keys.
pub fn due_reminders(
    upcoming: &[Event],
    windows: &[ReminderWindow],
    now: DateTime<Utc>,
) -> Vec<DueReminder> {
    let slot = Duration::minutes(FIRING_SLOT_MINUTES);
    let mut due = Vec::new();

    for event in upcoming {
        let Some(start) = event.start_time else {
            continue;
        };
        for window in windows {
            let reminder_time = start - window.offset;
            if now >= reminder_time && now < reminder_time + slot {
                due.push(DueReminder {
                    event: event.clone(),
                    reminder_type: window.label.to_string(),
                    reminder_key: format!("{}_{}", event.id, window.label),
                });
            }
        }
    }

    due
}
