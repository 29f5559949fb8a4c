//! Dispatch orchestration — ties window evaluation, dedup, composition, and
//! the SMS transport together for one invocation.
//!
//! Order per reminder: check tracker, compose, send, and only mark sent once
//! the gateway accepted the message. A failed send stays unmarked so the
//! reminder is eligible again at the next poll inside its firing slot.
//! Sends are sequential; at most one SMS is in flight per invocation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::compose::{demo_message, live_update_message, Summarizer};
use crate::events::model::Event;
use crate::remind::tracker::ReminderTracker;
use crate::remind::windows::{due_reminders, ReminderWindow};
use crate::sms::SmsTransport;

/// One successfully dispatched reminder.
#[derive(Debug, Serialize)]
pub struct ReminderDetail {
    pub event_id: String,
    pub event_title: String,
    pub reminder_type: String,
    pub message_id: Option<String>,
    pub ai_generated: bool,
    pub tokens_used: u32,
    pub service: &'static str,
    pub quota_remaining: Option<i64>,
}

#[derive(Debug, Default, Serialize)]
pub struct ReminderRun {
    pub sent: Vec<ReminderDetail>,
    pub skipped_already_sent: usize,
    pub failed: usize,
}

pub async fn run_reminder_pass(
    upcoming: &[Event],
    windows: &[ReminderWindow],
    tracker: &mut ReminderTracker,
    summarizer: &Summarizer,
    sms: &dyn SmsTransport,
    now: DateTime<Utc>,
) -> ReminderRun {
    let mut run = ReminderRun::default();

    for due in due_reminders(upcoming, windows, now) {
        if tracker.is_sent(&due.reminder_key) {
            run.skipped_already_sent += 1;
            continue;
        }

        let composed = summarizer
            .reminder_message(&due.event, &due.reminder_type)
            .await;

        match sms.send(&composed.content).await {
            Ok(delivery) => {
                tracker.mark_sent(&due.reminder_key);
                info!(
                    event = %due.event.title,
                    reminder_type = %due.reminder_type,
                    "reminder dispatched"
                );
                run.sent.push(ReminderDetail {
                    event_id: due.event.id.clone(),
                    event_title: due.event.title.clone(),
                    reminder_type: due.reminder_type.clone(),
                    message_id: delivery.message_id,
                    ai_generated: composed.ai_generated,
                    tokens_used: composed.tokens_used,
                    service: sms.service_name(),
                    quota_remaining: delivery.quota_remaining,
                });
            }
            Err(e) => {
                warn!(reminder_key = %due.reminder_key, "reminder send failed: {e}");
                run.failed += 1;
            }
        }
    }

    run
}

#[derive(Debug, Serialize)]
pub struct UpdateRun {
    pub update_sent: bool,
    pub events_today: usize,
    pub message_id: Option<String>,
    pub quota_remaining: Option<i64>,
    pub reason: Option<String>,
}

/// Batches today's events into one message, at most once per wall-clock
/// minute bucket. The production scheduler polls every 5 minutes, so the
/// bucket key gives one update per poll at most.
pub async fn run_update_pass(
    upcoming: &[Event],
    tracker: &mut ReminderTracker,
    sms: &dyn SmsTransport,
    now: DateTime<Utc>,
) -> UpdateRun {
    let today: Vec<Event> = upcoming
        .iter()
        .filter(|e| matches!(e.start_time, Some(t) if t.date_naive() == now.date_naive()))
        .cloned()
        .collect();

    let mut run = UpdateRun {
        update_sent: false,
        events_today: today.len(),
        message_id: None,
        quota_remaining: None,
        reason: None,
    };

    if today.is_empty() {
        run.reason = Some("No events today".to_string());
        return run;
    }

    let interval_key = format!("update_{}", now.format("%Y%m%d_%H%M"));
    if tracker.is_sent(&interval_key) {
        run.reason = Some("Update already sent for this interval".to_string());
        return run;
    }

    let message = live_update_message(&today, now);
    match sms.send(&message).await {
        Ok(delivery) => {
            tracker.mark_sent(&interval_key);
            run.update_sent = true;
            run.message_id = delivery.message_id;
            run.quota_remaining = delivery.quota_remaining;
        }
        Err(e) => {
            warn!("live update send failed: {e}");
            run.reason = Some(e.to_string());
        }
    }

    run
}

/// How many upcoming events the digest message describes.
const DIGEST_TOP_EVENTS: usize = 3;

#[derive(Debug)]
pub enum DigestOutcome {
    NoEvents,
    Sent {
        events_included: usize,
        message_id: Option<String>,
        ai_generated: bool,
        tokens_used: u32,
        service: &'static str,
        quota_remaining: Option<i64>,
    },
    Failed {
        error: String,
    },
}

pub async fn run_digest(
    upcoming: &[Event],
    summarizer: &Summarizer,
    sms: &dyn SmsTransport,
) -> DigestOutcome {
    if upcoming.is_empty() {
        return DigestOutcome::NoEvents;
    }

    let top = &upcoming[..upcoming.len().min(DIGEST_TOP_EVENTS)];
    let composed = summarizer.weekly_digest(top).await;

    match sms.send(&composed.content).await {
        Ok(delivery) => DigestOutcome::Sent {
            events_included: upcoming.len(),
            message_id: delivery.message_id,
            ai_generated: composed.ai_generated,
            tokens_used: composed.tokens_used,
            service: sms.service_name(),
            quota_remaining: delivery.quota_remaining,
        },
        Err(e) => {
            warn!("digest send failed: {e}");
            DigestOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}

#[derive(Debug)]
pub enum DemoOutcome {
    Sent {
        events_found: usize,
        message_id: Option<String>,
        service: &'static str,
        quota_remaining: Option<i64>,
    },
    Failed {
        events_found: usize,
        error: String,
    },
}

/// Sends a message about the next event (or a no-events notice) regardless
/// of timing. Integration verification only — bypasses the tracker.
pub async fn run_demo(upcoming: &[Event], sms: &dyn SmsTransport) -> DemoOutcome {
    let message = demo_message(upcoming.first());

    match sms.send(&message).await {
        Ok(delivery) => DemoOutcome::Sent {
            events_found: upcoming.len(),
            message_id: delivery.message_id,
            service: sms.service_name(),
            quota_remaining: delivery.quota_remaining,
        },
        Err(e) => DemoOutcome::Failed {
            events_found: upcoming.len(),
            error: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remind::windows::reminder_windows;
    use crate::sms::{Delivery, SmsError};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Records sent messages; flips to failure mode on demand.
    struct FakeSms {
        sent: Mutex<Vec<String>>,
        fail: AtomicBool,
    }

    impl FakeSms {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: AtomicBool::new(false),
            }
        }

        fn failing() -> Self {
            let fake = Self::new();
            fake.fail.store(true, Ordering::SeqCst);
            fake
        }

        fn sent_messages(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SmsTransport for FakeSms {
        async fn send(&self, message: &str) -> Result<Delivery, SmsError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(SmsError::Gateway {
                    message: "Out of quota".to_string(),
                    quota_remaining: Some(0),
                });
            }
            self.sent.lock().unwrap().push(message.to_string());
            Ok(Delivery {
                message_id: Some("msg-1".to_string()),
                quota_remaining: Some(41),
                to: "+15551234567".to_string(),
            })
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, 18, 0, 0).unwrap()
    }

    fn event(title: &str, start: DateTime<Utc>) -> Event {
        Event {
            id: crate::events::model::event_id(title, "https://lu.ma/event/t"),
            title: title.to_string(),
            start_time: Some(start),
            formatted_date: "Aug 8".to_string(),
            link: "https://lu.ma/event/t".to_string(),
            description: String::new(),
            location: String::new(),
        }
    }

    fn summarizer() -> Summarizer {
        Summarizer::new(None, "gpt-3.5-turbo".to_string())
    }

    #[tokio::test]
    async fn due_reminder_is_sent_and_marked() {
        let dir = tempdir().unwrap();
        let mut tracker = ReminderTracker::load(dir.path().join("store.txt"));
        let sms = FakeSms::new();
        let upcoming = [event("Demo Day", now() + Duration::hours(24))];

        let run = run_reminder_pass(
            &upcoming,
            &reminder_windows(),
            &mut tracker,
            &summarizer(),
            &sms,
            now(),
        )
        .await;

        assert_eq!(run.sent.len(), 1);
        assert_eq!(run.sent[0].reminder_type, "24_hours");
        assert_eq!(run.sent[0].message_id.as_deref(), Some("msg-1"));
        assert!(!run.sent[0].ai_generated);
        assert!(tracker.is_sent(&format!("{}_24_hours", upcoming[0].id)));
        assert_eq!(sms.sent_messages().len(), 1);
    }

    #[tokio::test]
    async fn second_pass_skips_already_sent() {
        let dir = tempdir().unwrap();
        let mut tracker = ReminderTracker::load(dir.path().join("store.txt"));
        let sms = FakeSms::new();
        let upcoming = [event("Demo Day", now() + Duration::hours(24))];
        let windows = reminder_windows();

        run_reminder_pass(&upcoming, &windows, &mut tracker, &summarizer(), &sms, now()).await;
        let second =
            run_reminder_pass(&upcoming, &windows, &mut tracker, &summarizer(), &sms, now()).await;

        assert!(second.sent.is_empty());
        assert_eq!(second.skipped_already_sent, 1);
        assert_eq!(sms.sent_messages().len(), 1);
    }

    #[tokio::test]
    async fn failed_send_leaves_reminder_eligible() {
        let dir = tempdir().unwrap();
        let mut tracker = ReminderTracker::load(dir.path().join("store.txt"));
        let upcoming = [event("Demo Day", now() + Duration::hours(24))];
        let windows = reminder_windows();

        let failing = FakeSms::failing();
        let run =
            run_reminder_pass(&upcoming, &windows, &mut tracker, &summarizer(), &failing, now())
                .await;
        assert_eq!(run.failed, 1);
        assert!(run.sent.is_empty());
        assert!(!tracker.is_sent(&format!("{}_24_hours", upcoming[0].id)));

        // Next poll, transport recovered: the reminder goes out.
        let working = FakeSms::new();
        let run =
            run_reminder_pass(&upcoming, &windows, &mut tracker, &summarizer(), &working, now())
                .await;
        assert_eq!(run.sent.len(), 1);
    }

    #[tokio::test]
    async fn event_outside_all_windows_sends_nothing() {
        let dir = tempdir().unwrap();
        let mut tracker = ReminderTracker::load(dir.path().join("store.txt"));
        let sms = FakeSms::new();
        let upcoming = [event("Demo Day", now() + Duration::hours(48))];

        let run = run_reminder_pass(
            &upcoming,
            &reminder_windows(),
            &mut tracker,
            &summarizer(),
            &sms,
            now(),
        )
        .await;

        assert!(run.sent.is_empty());
        assert!(sms.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn update_pass_sends_once_per_bucket() {
        let dir = tempdir().unwrap();
        let mut tracker = ReminderTracker::load(dir.path().join("store.txt"));
        let sms = FakeSms::new();
        let upcoming = [event("Tonight", now() + Duration::hours(2))];

        let first = run_update_pass(&upcoming, &mut tracker, &sms, now()).await;
        assert!(first.update_sent);
        assert_eq!(first.events_today, 1);

        let second = run_update_pass(&upcoming, &mut tracker, &sms, now()).await;
        assert!(!second.update_sent);
        assert_eq!(
            second.reason.as_deref(),
            Some("Update already sent for this interval")
        );

        // A later bucket sends again.
        let third =
            run_update_pass(&upcoming, &mut tracker, &sms, now() + Duration::minutes(5)).await;
        assert!(third.update_sent);
        assert_eq!(sms.sent_messages().len(), 2);
    }

    #[tokio::test]
    async fn update_pass_with_no_events_today() {
        let dir = tempdir().unwrap();
        let mut tracker = ReminderTracker::load(dir.path().join("store.txt"));
        let sms = FakeSms::new();
        let upcoming = [event("Next week", now() + Duration::days(6))];

        let run = run_update_pass(&upcoming, &mut tracker, &sms, now()).await;
        assert!(!run.update_sent);
        assert_eq!(run.events_today, 0);
        assert!(sms.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn failed_update_does_not_consume_the_bucket() {
        let dir = tempdir().unwrap();
        let mut tracker = ReminderTracker::load(dir.path().join("store.txt"));
        let upcoming = [event("Tonight", now() + Duration::hours(2))];

        let failing = FakeSms::failing();
        let run = run_update_pass(&upcoming, &mut tracker, &failing, now()).await;
        assert!(!run.update_sent);

        let working = FakeSms::new();
        let run = run_update_pass(&upcoming, &mut tracker, &working, now()).await;
        assert!(run.update_sent);
    }

    #[tokio::test]
    async fn digest_over_no_events_short_circuits() {
        let sms = FakeSms::new();
        let outcome = run_digest(&[], &summarizer(), &sms).await;
        assert!(matches!(outcome, DigestOutcome::NoEvents));
        assert!(sms.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn digest_reports_all_upcoming_but_messages_top_three() {
        let sms = FakeSms::new();
        let upcoming: Vec<Event> = (0..5)
            .map(|i| event(&format!("Event {i}"), now() + Duration::days(i + 1)))
            .collect();

        let outcome = run_digest(&upcoming, &summarizer(), &sms).await;
        match outcome {
            DigestOutcome::Sent { events_included, .. } => assert_eq!(events_included, 5),
            other => panic!("expected Sent, got {other:?}"),
        }
        let message = &sms.sent_messages()[0];
        assert!(message.contains("Event 2"));
        assert!(!message.contains("Event 3"));
    }

    #[tokio::test]
    async fn demo_sends_regardless_of_timing() {
        let sms = FakeSms::new();
        let upcoming = [event("Far Future", now() + Duration::days(30))];

        let outcome = run_demo(&upcoming, &sms).await;
        assert!(matches!(outcome, DemoOutcome::Sent { events_found: 1, .. }));
        assert!(sms.sent_messages()[0].contains("Far Future"));
    }

    #[tokio::test]
    async fn demo_failure_is_reported_not_raised() {
        let failing = FakeSms::failing();
        let outcome = run_demo(&[], &failing).await;
        match outcome {
            DemoOutcome::Failed { events_found, error } => {
                assert_eq!(events_found, 0);
                assert!(error.contains("Out of quota"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
