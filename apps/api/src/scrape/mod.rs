//! Fetching and extraction of events from the listing page.
//!
//! `EventScraper` owns the outbound HTTP client and turns a page fetch into
//! a [`FetchResult`]. Fetch or extraction trouble never propagates: the
//! scraper degrades to the deterministic placeholder set, tagged
//! [`DataSource::Placeholder`] so callers can tell it apart from live data.

pub mod date;
pub mod extract;

use chrono::Utc;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::events::model::{event_id, Event};
use crate::scrape::extract::{extract_events, Extraction};

const FETCH_TIMEOUT_SECS: u64 = 30;

/// Where a batch of events came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Extracted from the live page.
    Live,
    /// The deterministic placeholder set — extraction yielded nothing.
    Placeholder,
}

impl DataSource {
    pub fn label(&self) -> &'static str {
        match self {
            DataSource::Live => "Luma (live)",
            DataSource::Placeholder => "Luma (placeholder)",
        }
    }
}

/// One scrape's worth of events plus their provenance.
#[derive(Debug)]
pub struct FetchResult {
    pub events: Vec<Event>,
    pub source: DataSource,
}

pub struct EventScraper {
    page_url: String,
    client: reqwest::Client,
}

impl EventScraper {
    pub fn new(page_url: String) -> Self {
        Self {
            page_url,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Fetches the listing page and extracts events.
    ///
    /// Never returns an error: fetch failures and empty extractions both
    /// degrade to the placeholder set.
    pub async fn fetch_events(&self) -> FetchResult {
        let html = match self.fetch_page().await {
            Ok(html) => html,
            Err(e) => {
                warn!("event page fetch failed: {e}");
                return self.placeholder_result();
            }
        };

        resolve_extraction(extract_events(&html, &self.page_url, Utc::now()), &self.page_url)
    }

    async fn fetch_page(&self) -> Result<String, reqwest::Error> {
        self.client
            .get(&self.page_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    fn placeholder_result(&self) -> FetchResult {
        FetchResult {
            events: placeholder_events(&self.page_url),
            source: DataSource::Placeholder,
        }
    }
}

/// Maps an extraction outcome to a tagged result: live events stay live, an
/// empty extraction becomes the placeholder set.
fn resolve_extraction(extraction: Extraction, page_url: &str) -> FetchResult {
    match extraction {
        Extraction::Events(events) => {
            debug!(count = events.len(), "events extracted");
            FetchResult {
                events,
                source: DataSource::Live,
            }
        }
        Extraction::Empty => {
            warn!("extraction yielded no events, serving placeholder set");
            FetchResult {
                events: placeholder_events(page_url),
                source: DataSource::Placeholder,
            }
        }
    }
}

/// Small deterministic stand-in set used when no live data is available.
///
/// Placeholder events carry no `start_time`, which keeps them out of the
/// upcoming/past views and therefore out of the reminder pipeline.
pub fn placeholder_events(page_url: &str) -> Vec<Event> {
    let entries = [
        ("Community Open House", "Drop in, meet the community, and see the space."),
        ("Weekly Builders Meetup", "Show what you are working on and find collaborators."),
    ];
    entries
        .iter()
        .map(|(title, description)| Event {
            id: event_id(title, page_url),
            title: (*title).to_string(),
            start_time: None,
            formatted_date: "Date TBD".to_string(),
            link: page_url.to_string(),
            description: (*description).to_string(),
            location: String::new(),
        })
        .collect()
}
