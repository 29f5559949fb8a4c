//! Best-effort event extraction from the listing page's markup.
//!
//! The page format is not contractual, so extraction is an ordered cascade
//! of structural strategies: the first selector whose elements yield at
//! least one accepted event wins. Anything irregular degrades to a partial
//! or empty result — this module never fails its caller.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

use crate::events::model::{event_id, truncate_chars, Event, MAX_DESCRIPTION_CHARS};
use crate::scrape::date::parse_event_date;

/// Hard cap on extracted events, bounding message size and scraping cost.
pub const MAX_EVENTS: usize = 10;

/// Candidate container selectors, in priority order.
const CANDIDATE_SELECTORS: &[&str] = &[
    r#"div[class*="event-card"], div[class*="content-card"]"#,
    r#"a[href*="/event/"]"#,
    "[data-event-id]",
    r#"article, div[class*="card"]"#,
];

/// Anchor text that is page chrome, not an event title.
const CHROME_WORDS: &[&str] = &["view", "more", "join", "follow"];

static DATE_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\d{1,2}:\d{2}|[a-z]{3,9}\.?\s+\d{1,2}").unwrap());

/// Outcome of one extraction pass over a document.
#[derive(Debug)]
pub enum Extraction {
    /// Live events, in page order, deduplicated by id, capped at [`MAX_EVENTS`].
    Events(Vec<Event>),
    /// The document parsed but no strategy produced an accepted event.
    Empty,
}

pub fn extract_events(html: &str, page_url: &str, now: DateTime<Utc>) -> Extraction {
    let document = Html::parse_document(html);

    for css in CANDIDATE_SELECTORS {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        let events = collect_events(document.select(&selector), page_url, now);
        if !events.is_empty() {
            return Extraction::Events(events);
        }
    }

    let fallback = anchor_fallback(&document, page_url);
    if fallback.is_empty() {
        Extraction::Empty
    } else {
        Extraction::Events(fallback)
    }
}

fn collect_events<'a>(
    elements: impl Iterator<Item = ElementRef<'a>>,
    page_url: &str,
    now: DateTime<Utc>,
) -> Vec<Event> {
    let mut seen = HashSet::new();
    let mut events = Vec::new();
    for element in elements {
        let Some(event) = extract_card(element, page_url, now) else {
            continue;
        };
        if seen.insert(event.id.clone()) {
            events.push(event);
        }
        if events.len() >= MAX_EVENTS {
            break;
        }
    }
    events
}

/// Extracts one event from a candidate element. Each field resolves through
/// its own sub-cascade; the candidate is accepted only if it has a
/// non-trivially short title and an event-detail link.
fn extract_card(element: ElementRef, page_url: &str, now: DateTime<Utc>) -> Option<Event> {
    let title = extract_title(element);
    let link = extract_link(element, page_url);

    // Existence check: promotional and navigation noise has short text or
    // links somewhere other than an event page.
    if title.trim().chars().count() <= 3 || !is_event_link(&link) {
        return None;
    }

    let date_text = extract_date_text(element);
    let description = first_text(element, &[r#"p[class*="desc"]"#, r#"div[class*="desc"]"#, r#"p[class*="summary"]"#, r#"div[class*="summary"]"#]);
    let location = first_text(element, &[r#"span[class*="location"]"#, r#"div[class*="location"]"#, r#"span[class*="venue"]"#, r#"div[class*="venue"]"#]);

    Some(Event {
        id: event_id(&title, &link),
        title,
        start_time: parse_event_date(&date_text, now),
        formatted_date: if date_text.is_empty() {
            "Date TBD".to_string()
        } else {
            date_text
        },
        link,
        description: truncate_chars(&description, MAX_DESCRIPTION_CHARS),
        location,
    })
}

fn extract_title(element: ElementRef) -> String {
    let heading = first_text(element, &["h2", "h3", "h4"]);
    if !heading.is_empty() {
        return heading;
    }
    let classed = first_text(element, &[r#"div[class*="title"]"#, r#"div[class*="name"]"#, r#"span[class*="title"]"#]);
    if !classed.is_empty() {
        return classed;
    }
    truncate_chars(&element_text(element), 100)
}

fn extract_link(element: ElementRef, page_url: &str) -> String {
    let href = if element.value().name() == "a" {
        element.value().attr("href")
    } else {
        Selector::parse("a[href]")
            .ok()
            .and_then(|sel| element.select(&sel).next())
            .and_then(|a| a.value().attr("href"))
    };
    match href {
        Some(href) => absolutize(href, page_url),
        None => page_url.to_string(),
    }
}

/// Resolves a possibly-relative href against the listing page URL.
fn absolutize(href: &str, page_url: &str) -> String {
    if href.starts_with("http") {
        return href.to_string();
    }
    Url::parse(page_url)
        .and_then(|base| base.join(href))
        .map(String::from)
        .unwrap_or_else(|_| page_url.to_string())
}

fn is_event_link(link: &str) -> bool {
    link.contains("/event/") || link.contains("lu.ma")
}

fn extract_date_text(element: ElementRef) -> String {
    let classed = first_text(
        element,
        &["time", r#"span[class*="date"]"#, r#"span[class*="time"]"#, r#"div[class*="date"]"#],
    );
    if !classed.is_empty() {
        return classed;
    }
    // No date-classed node; scan the element's own text for a date-like run.
    DATE_TEXT
        .find(&element_text(element))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Last resort: when no selector produced an accepted candidate, harvest
/// bare anchors that point at the event host, skipping UI chrome.
fn anchor_fallback(document: &Html, page_url: &str) -> Vec<Event> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut events = Vec::new();
    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.contains("lu.ma") && !href.contains("luma") {
            continue;
        }
        let title = element_text(anchor);
        if title.chars().count() <= 5 || is_chrome_text(&title) {
            continue;
        }
        let link = absolutize(href, page_url);
        let event = Event {
            id: event_id(&title, &link),
            title,
            start_time: None,
            formatted_date: "Date TBD".to_string(),
            link,
            description: String::new(),
            location: String::new(),
        };
        if seen.insert(event.id.clone()) {
            events.push(event);
        }
        if events.len() >= MAX_EVENTS {
            break;
        }
    }
    events
}

fn is_chrome_text(text: &str) -> bool {
    let lower = text.to_lowercase();
    CHROME_WORDS
        .iter()
        .any(|word| lower.split_whitespace().any(|token| token == *word))
}

/// Whitespace-normalized text content of an element.
fn element_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(element: ElementRef, selectors: &[&str]) -> String {
    for css in selectors {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        if let Some(found) = element.select(&selector).next() {
            let text = element_text(found);
            if !text.is_empty() {
                return text;
            }
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PAGE_URL: &str = "https://lu.ma/community-calendar";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
    }

    fn events(html: &str) -> Vec<Event> {
        match extract_events(html, PAGE_URL, now()) {
            Extraction::Events(events) => events,
            Extraction::Empty => Vec::new(),
        }
    }

    const CARD_HTML: &str = r#"<html><body>
        <div class="event-card">
            <h3>Founder Breakfast</h3>
            <a href="/event/founder-breakfast">Details</a>
            <span class="event-date">Aug 14, 2026 · 8:00 AM</span>
            <p class="description">Coffee and co-founder matching for early teams.</p>
            <span class="location">Main Hall</span>
        </div>
        <div class="content-card">
            <h2>Intro to Hardware Night</h2>
            <a href="https://lu.ma/event/hardware-night">RSVP</a>
            <span class="date">Sep 2, 2026 · 6:30 PM</span>
        </div>
    </body></html>"#;

    #[test]
    fn extracts_structured_cards() {
        let events = events(CARD_HTML);
        assert_eq!(events.len(), 2);

        let first = &events[0];
        assert_eq!(first.title, "Founder Breakfast");
        assert_eq!(first.link, "https://lu.ma/event/founder-breakfast");
        assert_eq!(first.formatted_date, "Aug 14, 2026 · 8:00 AM");
        assert_eq!(
            first.start_time,
            Some(Utc.with_ymd_and_hms(2026, 8, 14, 8, 0, 0).unwrap())
        );
        assert_eq!(first.description, "Coffee and co-founder matching for early teams.");
        assert_eq!(first.location, "Main Hall");
    }

    #[test]
    fn relative_links_are_absolutized() {
        let events = events(CARD_HTML);
        assert!(events[0].link.starts_with("https://lu.ma/"));
    }

    #[test]
    fn anchor_selector_is_used_when_no_cards_match() {
        let html = r#"<html><body>
            <a href="/event/rooftop-demo-day"><h4>Rooftop Demo Day</h4>
                <span class="date">Aug 20, 2026</span></a>
        </body></html>"#;
        let events = events(html);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Rooftop Demo Day");
        assert_eq!(events[0].link, "https://lu.ma/event/rooftop-demo-day");
    }

    #[test]
    fn short_titles_are_rejected() {
        let html = r#"<html><body>
            <div class="event-card"><h3>Go</h3><a href="/event/go"></a></div>
        </body></html>"#;
        assert!(events(html).is_empty());
    }

    #[test]
    fn non_event_links_are_rejected() {
        let html = r#"<html><body>
            <div class="event-card">
                <h3>Sponsored: Get 20% off</h3>
                <a href="https://ads.example.com/promo">Shop now</a>
            </div>
        </body></html>"#;
        assert!(events(html).is_empty());
    }

    #[test]
    fn duplicate_cards_collapse_to_one_event() {
        let html = r#"<html><body>
            <div class="event-card"><h3>Open Studio</h3><a href="/event/open-studio">x</a></div>
            <div class="event-card"><h3>Open Studio</h3><a href="/event/open-studio">x</a></div>
        </body></html>"#;
        assert_eq!(events(html).len(), 1);
    }

    #[test]
    fn result_is_capped() {
        let mut html = String::from("<html><body>");
        for i in 0..25 {
            html.push_str(&format!(
                r#"<div class="event-card"><h3>Meetup number {i}</h3><a href="/event/meetup-{i}">x</a></div>"#
            ));
        }
        html.push_str("</body></html>");
        assert_eq!(events(&html).len(), MAX_EVENTS);
    }

    #[test]
    fn anchor_fallback_harvests_bare_links() {
        let html = r#"<html><body>
            <nav><a href="https://lu.ma/all">View all</a></nav>
            <a href="https://lu.ma/morning-run-club">Morning Run Club</a>
            <a href="https://lu.ma/pitch-practice">Pitch Practice Night</a>
        </body></html>"#;
        let events = events(html);
        let titles: Vec<_> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Morning Run Club", "Pitch Practice Night"]);
        assert!(events.iter().all(|e| e.start_time.is_none()));
        assert!(events.iter().all(|e| e.formatted_date == "Date TBD"));
    }

    #[test]
    fn chrome_anchors_are_filtered() {
        let html = r#"<html><body>
            <a href="https://lu.ma/all">View all events</a>
            <a href="https://lu.ma/follow">Follow this calendar</a>
            <a href="https://lu.ma/join-us">Join the community</a>
        </body></html>"#;
        assert!(events(html).is_empty());
    }

    #[test]
    fn empty_document_is_empty_not_error() {
        assert!(matches!(
            extract_events("<html><body></body></html>", PAGE_URL, now()),
            Extraction::Empty
        ));
    }

    #[test]
    fn garbage_input_degrades_gracefully() {
        assert!(matches!(
            extract_events("%%% not markup at all <<<>", PAGE_URL, now()),
            Extraction::Empty
        ));
    }

    #[test]
    fn date_is_scanned_from_surrounding_text_when_unclassed() {
        let html = r#"<html><body>
            <div class="event-card">
                <h3>Community Potluck</h3>
                <a href="/event/potluck">RSVP</a>
                <div>Doors at 18:00, bring a dish</div>
            </div>
        </body></html>"#;
        let events = events(html);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].formatted_date, "18:00");
    }
}
