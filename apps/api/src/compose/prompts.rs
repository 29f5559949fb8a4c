// Prompts for SMS composition. Each service that needs LLM calls keeps its
// prompts beside it; these are the only ones in the codebase.

use crate::events::model::Event;

/// System prompt shared by all reminder compositions.
pub const REMINDER_SYSTEM: &str = "You write short, friendly SMS reminders for community events. \
    One message, no preamble, no hashtags, no quotes around the message. \
    Always include the event link. Keep it under 160 characters.";

pub const DIGEST_SYSTEM: &str = "You write a short, upbeat SMS digest of the week's community events. \
    One message, no preamble. Mention each event once. Keep it under 160 characters.";

/// Builds the user prompt for a reminder, or `None` for an unknown window
/// label (callers fall back to the deterministic template).
pub fn reminder_prompt(event: &Event, reminder_type: &str) -> Option<String> {
    let timing = match reminder_type {
        "24_hours" => "tomorrow",
        "2_hours" => "in 2 hours",
        "30_minutes" => "in 30 minutes",
        _ => return None,
    };

    let description: String = event.description.chars().take(200).collect();
    Some(format!(
        "Write an SMS reminding the recipient that this event starts {timing}.\n\
         Title: {}\nWhen: {}\nWhere: {}\nAbout: {}\nLink: {}",
        event.title,
        event.formatted_date,
        if event.location.is_empty() { "TBA" } else { event.location.as_str() },
        description,
        event.link,
    ))
}

pub fn digest_prompt(events: &[Event]) -> String {
    let listing = events
        .iter()
        .take(5)
        .map(|e| format!("- {} ({})", e.title, e.formatted_date))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Write an SMS digest of this week's {} upcoming community events:\n{listing}",
        events.len(),
    )
}
