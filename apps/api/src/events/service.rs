//! Time-filtered views over the scraped events.
//!
//! Every public method re-scrapes the page — there is no caching layer, so
//! repeated calls are not free and two calls may disagree if the page
//! changed in between. Call frequency is human-scale, which makes that
//! acceptable.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::events::model::Event;
use crate::scrape::{DataSource, EventScraper, FetchResult};

pub struct EventService {
    scraper: EventScraper,
}

/// Summary of the soonest upcoming event, for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct NextEvent {
    pub title: String,
    pub date: String,
    pub link: String,
}

#[derive(Debug, Serialize)]
pub struct EventStats {
    pub total_events: usize,
    pub upcoming_events: usize,
    pub past_events: usize,
    pub next_event: Option<NextEvent>,
    pub data_source: &'static str,
}

impl EventService {
    pub fn new(page_url: String) -> Self {
        Self {
            scraper: EventScraper::new(page_url),
        }
    }

    pub async fn fetch_all(&self) -> FetchResult {
        self.scraper.fetch_events().await
    }

    /// Live events strictly in the future, soonest first. Placeholder data
    /// and events with an unknown start time never appear here, so nothing
    /// downstream can schedule a reminder against them.
    pub async fn upcoming(&self) -> Vec<Event> {
        let fetched = self.fetch_all().await;
        if fetched.source != DataSource::Live {
            return Vec::new();
        }
        filter_upcoming(&fetched.events, Utc::now())
    }

    /// Live events that have already started, most recent first.
    pub async fn past(&self) -> Vec<Event> {
        let fetched = self.fetch_all().await;
        if fetched.source != DataSource::Live {
            return Vec::new();
        }
        filter_past(&fetched.events, Utc::now())
    }

    /// One scrape, three counts, and the soonest upcoming event.
    pub async fn stats(&self) -> EventStats {
        let fetched = self.fetch_all().await;
        let now = Utc::now();
        let (upcoming, past) = if fetched.source == DataSource::Live {
            (
                filter_upcoming(&fetched.events, now),
                filter_past(&fetched.events, now),
            )
        } else {
            (Vec::new(), Vec::new())
        };

        EventStats {
            total_events: fetched.events.len(),
            upcoming_events: upcoming.len(),
            past_events: past.len(),
            next_event: upcoming.first().map(|e| NextEvent {
                title: e.title.clone(),
                date: e.formatted_date.clone(),
                link: e.link.clone(),
            }),
            data_source: fetched.source.label(),
        }
    }
}

/// Events with a known start time strictly after `now`, ascending.
pub fn filter_upcoming(events: &[Event], now: DateTime<Utc>) -> Vec<Event> {
    let mut upcoming: Vec<Event> = events
        .iter()
        .filter(|e| matches!(e.start_time, Some(t) if t > now))
        .cloned()
        .collect();
    upcoming.sort_by_key(|e| e.start_time);
    upcoming
}

/// Events with a known start time at or before `now`, descending.
pub fn filter_past(events: &[Event], now: DateTime<Utc>) -> Vec<Event> {
    let mut past: Vec<Event> = events
        .iter()
        .filter(|e| matches!(e.start_time, Some(t) if t <= now))
        .cloned()
        .collect();
    past.sort_by_key(|e| std::cmp::Reverse(e.start_time));
    past
}
