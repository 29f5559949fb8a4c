//! Message composition — turns events into send-ready SMS text.
//!
//! The `Summarizer` prefers the LLM and degrades to deterministic templates
//! on any failure (or when no API key is configured), so composition itself
//! can never fail a dispatch. Live-update and demo messages are always
//! deterministic — they carry times computed at composition, which the LLM
//! adds nothing to.

pub mod prompts;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::events::model::Event;
use crate::llm_client::{LlmClient, LlmError};

const REMINDER_MAX_TOKENS: u32 = 150;
const DIGEST_MAX_TOKENS: u32 = 300;

/// Send-ready text plus how it was produced.
#[derive(Debug, Clone)]
pub struct ComposedMessage {
    pub content: String,
    pub tokens_used: u32,
    pub model: String,
    pub ai_generated: bool,
}

impl ComposedMessage {
    fn fallback(content: String) -> Self {
        Self {
            content,
            tokens_used: 0,
            model: "fallback".to_string(),
            ai_generated: false,
        }
    }
}

pub struct Summarizer {
    llm: Option<LlmClient>,
}

impl Summarizer {
    /// With no API key the summarizer composes from templates only.
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self {
            llm: api_key.map(|key| LlmClient::new(key, model)),
        }
    }

    pub async fn reminder_message(&self, event: &Event, reminder_type: &str) -> ComposedMessage {
        let Some(llm) = &self.llm else {
            return fallback_reminder(event, reminder_type);
        };
        let Some(user_prompt) = prompts::reminder_prompt(event, reminder_type) else {
            return fallback_reminder(event, reminder_type);
        };

        match llm
            .chat(prompts::REMINDER_SYSTEM, &user_prompt, REMINDER_MAX_TOKENS, 0.7)
            .await
        {
            Ok(completion) => completed(completion),
            Err(e) => {
                log_fallback("reminder", &e);
                fallback_reminder(event, reminder_type)
            }
        }
    }

    pub async fn weekly_digest(&self, events: &[Event]) -> ComposedMessage {
        let Some(llm) = &self.llm else {
            return fallback_digest(events);
        };

        let user_prompt = prompts::digest_prompt(events);
        match llm
            .chat(prompts::DIGEST_SYSTEM, &user_prompt, DIGEST_MAX_TOKENS, 0.7)
            .await
        {
            Ok(completion) => completed(completion),
            Err(e) => {
                log_fallback("digest", &e);
                fallback_digest(events)
            }
        }
    }
}

fn completed(completion: crate::llm_client::Completion) -> ComposedMessage {
    ComposedMessage {
        content: completion.content,
        tokens_used: completion.total_tokens,
        model: completion.model,
        ai_generated: true,
    }
}

fn log_fallback(kind: &str, error: &LlmError) {
    warn!("{kind} composition falling back to template: {error}");
}

fn fallback_reminder(event: &Event, reminder_type: &str) -> ComposedMessage {
    let location = if event.location.is_empty() {
        "TBA"
    } else {
        event.location.as_str()
    };
    let content = match reminder_type {
        "2_hours" => format!(
            "⏰ Starting soon! {}\n🕒 In 2 hours\n📍 {location}\n🔗 {}",
            event.title, event.link
        ),
        "30_minutes" => format!("🚨 NOW! {} starts in 30 min!\n🔗 {}", event.title, event.link),
        // "24_hours" and anything unrecognized
        _ => format!(
            "📅 Tomorrow: {}\n🕒 {}\n🔗 RSVP: {}",
            event.title, event.formatted_date, event.link
        ),
    };
    ComposedMessage::fallback(content)
}

fn fallback_digest(events: &[Event]) -> ComposedMessage {
    let mut digest = "📊 This Week\n\n".to_string();
    for event in events.iter().take(5) {
        digest.push_str(&format!("• {} - {}\n", event.title, event.formatted_date));
    }
    digest.push_str(&format!("\n{} total events this week!", events.len()));
    ComposedMessage::fallback(digest)
}

/// Deterministic batched message for today's events.
pub fn live_update_message(today: &[Event], now: DateTime<Utc>) -> String {
    if today.len() == 1 {
        let event = &today[0];
        let time_str = match event.start_time {
            Some(start) => {
                let until = start - now;
                let hours = until.num_hours();
                let minutes = until.num_minutes() % 60;
                if hours > 0 {
                    format!("{hours}h {minutes}m")
                } else {
                    format!("{minutes}m")
                }
            }
            None => event.formatted_date.clone(),
        };
        return format!(
            "🕒 Today's Event: {}\n⏰ Starting in {time_str}\n🔗 {}",
            event.title, event.link
        );
    }

    let mut message = format!("📅 Today: {} events happening!\n", today.len());
    for (i, event) in today.iter().take(3).enumerate() {
        let at = match event.start_time {
            Some(start) => start.format("%I:%M %p").to_string(),
            None => event.formatted_date.clone(),
        };
        message.push_str(&format!("{}. {} at {at}\n", i + 1, event.title));
    }
    if today.len() > 3 {
        message.push_str(&format!("...and {} more!", today.len() - 3));
    }
    message
}

/// Demo message about the next event (or a no-events notice), sent
/// regardless of timing for integration verification.
pub fn demo_message(next: Option<&Event>) -> String {
    match next {
        None => "🤖 Demo SMS from the calendar agent!\n\n📅 No upcoming events found on the community calendar.\n\n✅ SMS integration working!".to_string(),
        Some(event) => {
            let when = match event.start_time {
                Some(start) => start.format("%m/%d at %I:%M %p").to_string(),
                None => event.formatted_date.clone(),
            };
            format!(
                "🤖 Demo: next event!\n\n📅 {}\n⏰ {when}\n🔗 {}\n\n✅ SMS working!",
                event.title, event.link
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(title: &str, start: Option<DateTime<Utc>>) -> Event {
        Event {
            id: "abc123def456".into(),
            title: title.into(),
            start_time: start,
            formatted_date: "Aug 14".into(),
            link: "https://lu.ma/event/t".into(),
            description: String::new(),
            location: String::new(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn no_api_key_means_template_reminder() {
        let summarizer = Summarizer::new(None, "gpt-3.5-turbo".into());
        let composed = summarizer
            .reminder_message(&event("Demo Day", None), "24_hours")
            .await;
        assert!(!composed.ai_generated);
        assert_eq!(composed.model, "fallback");
        assert_eq!(composed.tokens_used, 0);
        assert!(composed.content.contains("Tomorrow: Demo Day"));
        assert!(composed.content.contains("https://lu.ma/event/t"));
    }

    #[tokio::test]
    async fn each_window_has_a_distinct_template() {
        let summarizer = Summarizer::new(None, "gpt-3.5-turbo".into());
        let event = event("Demo Day", None);

        let day = summarizer.reminder_message(&event, "24_hours").await;
        let hours = summarizer.reminder_message(&event, "2_hours").await;
        let minutes = summarizer.reminder_message(&event, "30_minutes").await;

        assert!(day.content.contains("Tomorrow"));
        assert!(hours.content.contains("In 2 hours"));
        assert!(minutes.content.contains("30 min"));
    }

    #[tokio::test]
    async fn unknown_window_uses_day_template() {
        let summarizer = Summarizer::new(None, "gpt-3.5-turbo".into());
        let composed = summarizer
            .reminder_message(&event("Demo Day", None), "someday")
            .await;
        assert!(composed.content.contains("Tomorrow"));
    }

    #[tokio::test]
    async fn digest_fallback_lists_events_and_count() {
        let summarizer = Summarizer::new(None, "gpt-3.5-turbo".into());
        let events: Vec<Event> = (0..6).map(|i| event(&format!("Event {i}"), None)).collect();
        let composed = summarizer.weekly_digest(&events).await;
        assert!(!composed.ai_generated);
        assert!(composed.content.contains("Event 0"));
        assert!(composed.content.contains("Event 4"));
        assert!(!composed.content.contains("Event 5"));
        assert!(composed.content.contains("6 total events"));
    }

    #[test]
    fn single_event_update_shows_countdown() {
        let events = [event("Demo Day", Some(now() + chrono::Duration::minutes(150)))];
        let message = live_update_message(&events, now());
        assert!(message.contains("Today's Event: Demo Day"));
        assert!(message.contains("Starting in 2h 30m"));
    }

    #[test]
    fn sub_hour_countdown_omits_hours() {
        let events = [event("Demo Day", Some(now() + chrono::Duration::minutes(45)))];
        let message = live_update_message(&events, now());
        assert!(message.contains("Starting in 45m"));
    }

    #[test]
    fn multi_event_update_lists_top_three() {
        let events: Vec<Event> = (0..5)
            .map(|i| {
                event(
                    &format!("Event {i}"),
                    Some(now() + chrono::Duration::hours(i + 1)),
                )
            })
            .collect();
        let message = live_update_message(&events, now());
        assert!(message.contains("5 events happening"));
        assert!(message.contains("1. Event 0"));
        assert!(message.contains("3. Event 2"));
        assert!(!message.contains("4. Event 3"));
        assert!(message.contains("...and 2 more!"));
    }

    #[test]
    fn demo_message_without_events() {
        let message = demo_message(None);
        assert!(message.contains("No upcoming events"));
    }

    #[test]
    fn demo_message_with_event_includes_time_and_link() {
        let start = Utc.with_ymd_and_hms(2026, 8, 14, 19, 0, 0).unwrap();
        let e = event("Demo Day", Some(start));
        let message = demo_message(Some(&e));
        assert!(message.contains("Demo Day"));
        assert!(message.contains("08/14 at 07:00 PM"));
        assert!(message.contains("https://lu.ma/event/t"));
    }
}
