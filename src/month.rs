//! Month keys ("Nov 2025") and the permissive date parsing chain used when
//! expense records are created or edited.

use chrono::NaiveDate;

use crate::time::Clock;

/// Wire format for month keys, e.g. "Nov 2025".
pub const MONTH_KEY_FORMAT: &str = "%b %Y";

/// Canonical stored calendar-date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fallback day-month-year formats tried in order when a calendar date is
/// not canonical. First success wins.
const DATE_FALLBACK_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y", "%d %m %Y"];

/// Parses a month key into the first day of that month.
///
/// Free-text labels yield `None` rather than an error; stored data may
/// contain them and callers decide how to degrade.
pub fn parse_month_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("01 {}", key.trim()), "%d %b %Y").ok()
}

/// Formats a date as its month key.
pub fn month_key_of(date: NaiveDate) -> String {
    date.format(MONTH_KEY_FORMAT).to_string()
}

/// Tries each accepted calendar-date format in sequence.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Some(date);
    }
    DATE_FALLBACK_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// Outcome of the derivation chain: the month key the record is grouped
/// under and the calendar date to store, normalized when it parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedMonth {
    pub month: String,
    pub date: Option<String>,
}

/// Resolves the month key for a record write.
///
/// A parseable calendar date wins and is normalized to canonical form, an
/// explicit month key passes through verbatim, otherwise the current month
/// applies. Parse failures fall through silently to the next rule so
/// malformed legacy input never blocks a write; an unparseable date is kept
/// as given.
pub fn derive_month_key(
    date: Option<&str>,
    explicit_month: Option<&str>,
    clock: &dyn Clock,
) -> DerivedMonth {
    if let Some(raw) = date {
        if let Some(parsed) = parse_calendar_date(raw) {
            return DerivedMonth {
                month: month_key_of(parsed),
                date: Some(parsed.format(DATE_FORMAT).to_string()),
            };
        }
    }
    let month = match explicit_month.map(str::trim).filter(|key| !key.is_empty()) {
        Some(key) => key.to_string(),
        None => month_key_of(clock.today()),
    };
    DerivedMonth {
        month,
        date: date.map(str::to_string),
    }
}
