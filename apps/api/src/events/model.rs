use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Maximum length of a scraped event description.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// A calendar entry discovered on the events page.
///
/// Events carry no persisted identity across scrapes — `id` is recomputed
/// from (title, link) on every pass, so identical cards seen through
/// different selectors collapse to the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    /// `None` means the page gave us no parseable date. Such events are
    /// excluded from both the upcoming and past views.
    pub start_time: Option<DateTime<Utc>>,
    /// The date text exactly as displayed on the page, or "Date TBD".
    pub formatted_date: String,
    pub link: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
}

/// Stable short fingerprint over (title, link).
///
/// First 12 hex chars of sha-256 — collision-tolerant, not meant to be
/// cryptographically strong.
pub fn event_id(title: &str, link: &str) -> String {
    let digest = Sha256::digest(format!("{title}{link}").as_bytes());
    digest.iter().take(6).map(|b| format!("{b:02x}")).collect()
}

/// Truncates text to `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
