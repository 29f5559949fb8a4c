//! Date extraction from scraped display text.
//!
//! The page renders dates for humans ("Aug 14, 2026 · 7:00 PM"), so parsing
//! is pattern-based and best-effort. Unrecognized text yields `None` rather
//! than a guessed timestamp; callers treat `None` as "date unknown".

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static MONTH_DAY_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([a-z]{3,9})\.?\s+(\d{1,2})(?:st|nd|rd|th)?,\s*(\d{4})\b").unwrap());

static NUMERIC_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{4})\b").unwrap());

static MONTH_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([a-z]{3,9})\.?\s+(\d{1,2})(?:st|nd|rd|th)?\b").unwrap());

static TIME_OF_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2}):(\d{2})\s*(am|pm)?\b").unwrap());

/// Parses the display text into a UTC timestamp.
///
/// Recognized shapes: "Month D, YYYY", "Month D", "M/D/YYYY", "M-D-YYYY",
/// each with an optional "H:MM" / "H:MM AM|PM" time (midnight when absent).
/// A month-day without a year resolves to the current year, rolled forward
/// one year if that lands more than a day in the past. Timezone is assumed
/// UTC; the page does not expose one.
pub fn parse_event_date(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let date = parse_calendar_date(text, now)?;
    let time = parse_time_of_day(text).unwrap_or(NaiveTime::MIN);
    Some(date.and_time(time).and_utc())
}

fn parse_calendar_date(text: &str, now: DateTime<Utc>) -> Option<NaiveDate> {
    if let Some(caps) = MONTH_DAY_YEAR.captures(text) {
        if let Some(month) = month_number(&caps[1]) {
            let day: u32 = caps[2].parse().ok()?;
            let year: i32 = caps[3].parse().ok()?;
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(date);
            }
        }
    }

    if let Some(caps) = NUMERIC_DATE.captures(text) {
        // US ordering, matching how the source page renders numeric dates.
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    if let Some(caps) = MONTH_DAY.captures(text) {
        if let Some(month) = month_number(&caps[1]) {
            let day: u32 = caps[2].parse().ok()?;
            let this_year = NaiveDate::from_ymd_opt(now.year(), month, day)?;
            // Listing pages omit the year for dates in the near future. If the
            // current-year reading is already behind us, it means next year.
            if this_year < (now - Duration::days(1)).date_naive() {
                return NaiveDate::from_ymd_opt(now.year() + 1, month, day);
            }
            return Some(this_year);
        }
    }

    None
}

fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    let caps = TIME_OF_DAY.captures(text)?;
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    match caps.get(3).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(ref meridiem) if meridiem == "pm" && hour != 12 => hour += 12,
        Some(ref meridiem) if meridiem == "am" && hour == 12 => hour = 0,
        _ => {}
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let lower = name.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| lower.starts_with(m))
        .map(|i| i as u32 + 1)
}
