use std::sync::Arc;
use tokio::sync::Mutex;

use crate::compose::Summarizer;
use crate::config::Config;
use crate::events::service::EventService;
use crate::remind::tracker::ReminderTracker;
use crate::sms::SmsTransport;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Retained for handlers that need raw settings (none currently do —
    /// components capture what they need at construction).
    #[allow(dead_code)]
    pub config: Config,
    pub events: Arc<EventService>,
    /// Single-writer guard around the dedup tracker: the whole
    /// evaluate-due → filter-sent → send → mark-sent cycle runs under this
    /// lock, so overlapping invocations within one process cannot
    /// double-send. Cross-process runs still race on the store file.
    pub tracker: Arc<Mutex<ReminderTracker>>,
    pub summarizer: Arc<Summarizer>,
    /// Pluggable SMS transport. Production: TextBelt. Tests swap a fake.
    pub sms: Arc<dyn SmsTransport>,
}
