/// History queries: time ranges, visit records and the query service

use crate::error::PlatformError;
use crate::url_identity::VisitedSet;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Upper bound on records per search. Anything beyond is silently dropped.
pub const MAX_HISTORY_RESULTS: u32 = 10_000;

/// A time window in milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start_ms: f64,
    pub end_ms: f64,
}

impl TimeRange {
    pub fn new(start_ms: f64, end_ms: f64) -> TimeRange {
        TimeRange { start_ms, end_ms }
    }

    /// Everything from the epoch up to `now_ms`
    pub fn all_until(now_ms: f64) -> TimeRange {
        TimeRange::new(0.0, now_ms)
    }

    /// Build a range from the saved `start`/`end` strings.
    ///
    /// Each endpoint falls back on its own: a missing or unparsable start
    /// becomes the epoch, a missing or unparsable end becomes `now_ms`.
    pub fn from_saved(start: Option<&str>, end: Option<&str>, now_ms: f64) -> TimeRange {
        let start_ms = start.and_then(parse_local_datetime).unwrap_or(0.0);
        let end_ms = end.and_then(parse_local_datetime).unwrap_or(now_ms);
        TimeRange::new(start_ms, end_ms)
    }
}

/// Parse a saved date the way the browser's `Date` constructor reads it.
///
/// Accepted forms:
/// - `2024-05-01T10:30`, `2024-05-01T10:30:15`, space-separated too → local time
/// - RFC 3339 with an offset → that instant
/// - `2024-05-01` → UTC midnight
pub fn parse_local_datetime(input: &str) -> Option<f64> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
        return Some(instant.timestamp_millis() as f64);
    }

    const LOCAL_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];

    for format in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|local| local.timestamp_millis() as f64);
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis() as f64)
}

/// Search parameters in the shape `chrome.history.search` expects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
    pub max_results: u32,
}

impl HistoryQuery {
    pub fn for_range(range: TimeRange) -> HistoryQuery {
        HistoryQuery {
            text: String::new(),
            start_time: range.start_ms,
            end_time: range.end_ms,
            max_results: MAX_HISTORY_RESULTS,
        }
    }
}

/// One entry returned by the history log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisitRecord {
    pub url: Option<String>,
    pub title: Option<String>,
    pub last_visit_time: Option<f64>,
}

impl VisitRecord {
    pub fn new(url: &str, last_visit_time: f64) -> VisitRecord {
        VisitRecord {
            url: Some(url.to_string()),
            title: None,
            last_visit_time: Some(last_visit_time),
        }
    }
}

/// The browser's history log
#[allow(async_fn_in_trait)]
pub trait HistoryLog {
    async fn search(&self, query: &HistoryQuery) -> Result<Vec<VisitRecord>, PlatformError>;
}

/// Wall clock in epoch milliseconds
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Turns a time range into the set of visited URL keys
pub struct HistoryService<H> {
    log: H,
}

impl<H: HistoryLog> HistoryService<H> {
    pub fn new(log: H) -> Self {
        HistoryService { log }
    }

    /// Visited URLs in `range`, normalized. Records without a URL are skipped.
    pub async fn visited_between(&self, range: TimeRange) -> Result<VisitedSet, PlatformError> {
        let query = HistoryQuery::for_range(range);
        let records = self.log.search(&query).await?;
        let total = records.len();

        let visited = VisitedSet::from_urls(records.into_iter().filter_map(|record| record.url));

        log::debug!(
            "History {}..{}: {} records, {} distinct pages",
            range.start_ms,
            range.end_ms,
            total,
            visited.len()
        );

        Ok(visited)
    }
}
