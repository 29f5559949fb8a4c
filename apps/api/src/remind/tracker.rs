//! File-backed dedup tracking for dispatched reminders.
//!
//! The store is a flat text file of `reminder_key|ISO8601-timestamp` lines,
//! rewritten on every update. Each key keeps its original send time, and
//! entries past the retention horizon are dropped at load and at save.
//! Persistence is best-effort: an unreadable store means a fresh start, an
//! unwritable one leaves the tracker consistent in memory for the rest of
//! the process. Cross-process writers are not coordinated — callers hold
//! this behind the `AppState` mutex.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};

/// How long a sent reminder key suppresses re-sending.
pub const RETENTION_DAYS: i64 = 7;

pub struct ReminderTracker {
    path: PathBuf,
    sent: HashMap<String, DateTime<Utc>>,
}

impl ReminderTracker {
    /// Hydrates the tracker from the persisted store, keeping only entries
    /// within the retention horizon. A missing, unreadable, or corrupt store
    /// is a fresh start, never an error.
    pub fn load(path: PathBuf) -> Self {
        let sent = match fs::read_to_string(&path) {
            Ok(contents) => parse_store(&contents, Utc::now()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!("could not read reminder store {}: {e}", path.display());
                HashMap::new()
            }
        };
        debug!(count = sent.len(), "reminder tracker loaded");
        Self { path, sent }
    }

    pub fn is_sent(&self, reminder_key: &str) -> bool {
        self.sent.contains_key(reminder_key)
    }

    /// Marks a reminder as sent. The in-memory set is always updated so this
    /// process stays consistent; `false` means the store could not be
    /// persisted and a later process may not see the key.
    pub fn mark_sent(&mut self, reminder_key: &str) -> bool {
        self.sent.insert(reminder_key.to_string(), Utc::now());
        match self.persist() {
            Ok(()) => true,
            Err(e) => {
                warn!("could not persist reminder store {}: {e}", self.path.display());
                false
            }
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.len()
    }

    fn persist(&mut self) -> io::Result<()> {
        let horizon = Utc::now() - Duration::days(RETENTION_DAYS);
        self.sent.retain(|_, sent_at| *sent_at > horizon);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut contents = String::new();
        for (key, sent_at) in &self.sent {
            contents.push_str(key);
            contents.push('|');
            contents.push_str(&sent_at.to_rfc3339());
            contents.push('\n');
        }
        fs::write(&self.path, contents)
    }
}

fn parse_store(contents: &str, now: DateTime<Utc>) -> HashMap<String, DateTime<Utc>> {
    let horizon = now - Duration::days(RETENTION_DAYS);
    let mut sent = HashMap::new();
    for line in contents.lines() {
        let line = line.trim();
        let Some((key, timestamp)) = line.split_once('|') else {
            continue;
        };
        let Some(sent_at) = parse_timestamp(timestamp) else {
            continue;
        };
        if sent_at > horizon {
            sent.insert(key.to_string(), sent_at);
        }
    }
    sent
}

/// Accepts RFC 3339 and the naive ISO form older store files used.
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
