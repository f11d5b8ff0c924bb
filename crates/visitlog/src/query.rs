//! Searching and ordering the register for display.
//!
//! Everything here is a pure function of its inputs. Projections borrow from
//! the register and never reorder or modify it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::visitor::Visitor;

/// Display order by registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Oldest first.
    #[serde(rename = "asc", alias = "oldest")]
    Asc,
    /// Newest first.
    #[default]
    #[serde(rename = "desc", alias = "newest")]
    Desc,
}

impl SortOrder {
    /// The other order.
    #[must_use]
    pub fn toggle(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Label shown next to a listing.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Asc => "Oldest First",
            Self::Desc => "Newest First",
        }
    }
}

/// Records whose name or flat number contains `term`, ignoring case.
///
/// An empty term matches everything. Input order is kept.
#[must_use]
pub fn filter<'a>(records: &'a [Visitor], term: &str) -> Vec<&'a Visitor> {
    if term.is_empty() {
        return records.iter().collect();
    }

    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|r| {
            r.name().to_lowercase().contains(&needle)
                || r.flat_number().to_lowercase().contains(&needle)
        })
        .collect()
}

/// Order records by timestamp. Equal timestamps keep their relative order.
#[must_use]
pub fn sort<'a>(mut records: Vec<&'a Visitor>, order: SortOrder) -> Vec<&'a Visitor> {
    match order {
        SortOrder::Asc => records.sort_by_key(|r| r.timestamp()),
        SortOrder::Desc => records.sort_by(|a, b| b.timestamp().cmp(&a.timestamp())),
    }
    records
}

/// Search term and sort order that together define what is shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryView {
    /// Case-insensitive name or flat number fragment.
    pub search_term: String,
    /// Display order.
    pub sort_order: SortOrder,
}

impl QueryView {
    /// Create a view.
    #[must_use]
    pub fn new(search_term: impl Into<String>, sort_order: SortOrder) -> Self {
        Self {
            search_term: search_term.into(),
            sort_order,
        }
    }

    /// Filter then sort `records`.
    #[must_use]
    pub fn project<'a>(&self, records: &'a [Visitor]) -> Vec<&'a Visitor> {
        sort(filter(records, &self.search_term), self.sort_order)
    }
}

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 1_440;
const MINUTES_PER_MONTH: i64 = 43_200;
const MINUTES_PER_YEAR: i64 = 525_600;

/// Approximate distance between `timestamp` and `now` in words, such as
/// "5 minutes ago" or "about 2 hours ago".
#[must_use]
pub fn relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - timestamp).num_seconds();
    let future = seconds < 0;
    let minutes = (seconds.abs() + 30) / 60;

    let distance = if minutes < 1 {
        "less than a minute".to_string()
    } else if minutes == 1 {
        "1 minute".to_string()
    } else if minutes < 45 {
        format!("{minutes} minutes")
    } else if minutes < 90 {
        "about 1 hour".to_string()
    } else if minutes < MINUTES_PER_DAY {
        let hours = (minutes + MINUTES_PER_HOUR / 2) / MINUTES_PER_HOUR;
        format!("about {hours} hours")
    } else if minutes < 42 * MINUTES_PER_HOUR {
        "1 day".to_string()
    } else if minutes < MINUTES_PER_MONTH {
        let days = (minutes + MINUTES_PER_DAY / 2) / MINUTES_PER_DAY;
        format!("{days} days")
    } else if minutes < 45 * MINUTES_PER_DAY {
        "about 1 month".to_string()
    } else if minutes < 2 * MINUTES_PER_MONTH {
        "about 2 months".to_string()
    } else if minutes < MINUTES_PER_YEAR {
        let months = (minutes + MINUTES_PER_MONTH / 2) / MINUTES_PER_MONTH;
        format!("{months} months")
    } else {
        let years = minutes / MINUTES_PER_YEAR;
        if years == 1 {
            "about 1 year".to_string()
        } else {
            format!("about {years} years")
        }
    };

    if future {
        format!("in {distance}")
    } else {
        format!("{distance} ago")
    }
}
