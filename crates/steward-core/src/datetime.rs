//! Date/time normalization into the canonical `YYYY-MM-DDTHH:mm` form.
//!
//! Every timestamp the assistant stores or proposes goes through [`normalize`].
//! Values are local wall-clock times with minute precision and no offset.
//!
//! Accepts:
//! - Canonical: `2025-02-02T15:00`
//! - With seconds: `2025-02-02T15:00:00`, `2025-02-02T15:00:00.123`
//! - RFC 3339 (offset dropped, wall clock kept): `2025-02-02T15:00:00+05:00`
//! - Space separated: `2025-02-02 15:00`
//! - Date only: `2025-02-02` (tasks default to 23:59, meetings fail)
//! - Natural language relative to a reference "now": `tomorrow at 3pm`,
//!   `next friday 10:30`, `feb 3rd noon`, `in 2 days`, `in 3 hours`

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::defaults::{CANONICAL_FORMAT, DATE_FORMAT, TASK_DEFAULT_HOUR, TASK_DEFAULT_MINUTE};

/// Which entity a timestamp is being normalized for.
///
/// Decides what happens when an expression carries a date but no time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateTarget {
    /// Missing time defaults to 23:59 on that date.
    Task,
    /// Missing time is an error.
    Meeting,
}

/// Why an expression could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("date/time expression is empty")]
    Empty,

    #[error("no date or time found in '{0}'")]
    Unrecognized(String),

    #[error("a meeting needs a time of day, got '{0}'")]
    MissingTime(String),

    #[error("'{0}' is not a valid calendar date or time")]
    OutOfRange(String),
}

/// Format a timestamp in the canonical form.
pub fn format_canonical(dt: &NaiveDateTime) -> String {
    dt.format(CANONICAL_FORMAT).to_string()
}

/// Parse a canonical timestamp. Anything else returns `None`.
pub fn parse_canonical(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), CANONICAL_FORMAT).ok()
}

/// Human-readable rendering used in confirmation prompts, e.g. `Sun, 2 Feb 2025 at 15:00`.
pub fn render_human(dt: &NaiveDateTime) -> String {
    dt.format("%a, %-d %b %Y at %H:%M").to_string()
}

/// Normalize a date/time expression relative to `now`.
///
/// The result always survives a format/parse round trip through the
/// canonical form.
pub fn normalize(
    expr: &str,
    now: NaiveDateTime,
    target: DateTarget,
) -> Result<NaiveDateTime, NormalizeError> {
    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return Err(NormalizeError::Empty);
    }

    let resolved = if let Some(dt) = parse_absolute(trimmed) {
        truncate_to_minute(dt)
    } else if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        date_with_default_time(date, target, trimmed)?
    } else {
        parse_natural(trimmed, now, target)?
    };

    let canonical = format_canonical(&resolved);
    parse_canonical(&canonical).ok_or_else(|| NormalizeError::OutOfRange(trimmed.to_string()))
}

/// Normalize straight to the canonical string.
pub fn normalize_to_canonical(
    expr: &str,
    now: NaiveDateTime,
    target: DateTarget,
) -> Result<String, NormalizeError> {
    normalize(expr, now, target).map(|dt| format_canonical(&dt))
}

/// Normalize an optional field, treating any failure as absent.
pub fn normalize_optional(
    expr: Option<&str>,
    now: NaiveDateTime,
    target: DateTarget,
) -> Option<NaiveDateTime> {
    let expr = expr?;
    match normalize(expr, now, target) {
        Ok(dt) => Some(dt),
        Err(e) => {
            tracing::debug!(
                subsystem = "scheduling",
                component = "normalizer",
                expr,
                error = %e,
                "Date/time field treated as absent"
            );
            None
        }
    }
}

fn parse_absolute(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 6] = [
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
    ];

    for format in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    // Offsets are dropped: the wall-clock reading is what the user meant.
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_local())
}

fn truncate_to_minute(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt)
}

fn date_with_default_time(
    date: NaiveDate,
    target: DateTarget,
    expr: &str,
) -> Result<NaiveDateTime, NormalizeError> {
    match target {
        DateTarget::Task => date
            .and_hms_opt(TASK_DEFAULT_HOUR, TASK_DEFAULT_MINUTE, 0)
            .ok_or_else(|| NormalizeError::OutOfRange(expr.to_string())),
        DateTarget::Meeting => Err(NormalizeError::MissingTime(expr.to_string())),
    }
}

// =============================================================================
// Natural language
// =============================================================================

static EMBEDDED_ISO_T: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4}-\d{1,2}-\d{1,2})t(\d{1,2}:\d{2})").unwrap());

static RELATIVE_CLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bin (\d{1,4}) (hours?|hrs?|minutes?|mins?)\b").unwrap()
});

static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());

static RELATIVE_DAYS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bin (\d{1,3}) (days?|weeks?)\b").unwrap());

static WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:(this|next|coming)\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
    )
    .unwrap()
});

const MONTH_PATTERN: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

static MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b{}\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}}))?",
        MONTH_PATTERN
    ))
    .unwrap()
});

static DAY_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?{}\b(?:,?\s+(\d{{4}}))?",
        MONTH_PATTERN
    ))
    .unwrap()
});

static TWELVE_HOUR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})(?::(\d{2}))?\s*(am\b|pm\b|a\.m\.|p\.m\.)").unwrap()
});

static DAY_AFTER_TOMORROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bday after tomorrow\b").unwrap());
static TOMORROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"\btomorrow\b").unwrap());
static TODAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(today|tonight)\b").unwrap());
static NEXT_WEEK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bnext week\b").unwrap());

static NOON: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(noon|midday)\b").unwrap());
static MIDNIGHT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bmidnight\b").unwrap());
static END_OF_DAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(end of day|eod)\b").unwrap());

static TWENTY_FOUR_HOUR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2}):(\d{2})\b").unwrap());

static AT_HOUR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bat (\d{1,2})(?:[\s.,!?]|$)").unwrap());

fn parse_natural(
    expr: &str,
    now: NaiveDateTime,
    target: DateTarget,
) -> Result<NaiveDateTime, NormalizeError> {
    let lower = expr.to_lowercase();
    let lower = EMBEDDED_ISO_T.replace_all(&lower, "$1 $2").into_owned();

    if let Some(caps) = RELATIVE_CLOCK.captures(&lower) {
        let amount: i64 = caps[1]
            .parse()
            .map_err(|_| NormalizeError::OutOfRange(expr.to_string()))?;
        let offset = if caps[2].starts_with('h') {
            Duration::hours(amount)
        } else {
            Duration::minutes(amount)
        };
        return Ok(truncate_to_minute(now + offset));
    }

    let today = now.date();
    let date = find_date(&lower, today, expr)?;
    let time = find_time(&lower, expr)?;

    match (date, time) {
        (Some(date), Some(time)) => Ok(date.and_time(time)),
        (Some(date), None) => date_with_default_time(date, target, expr),
        (None, Some(time)) => Ok(today.and_time(time)),
        (None, None) => Err(NormalizeError::Unrecognized(expr.to_string())),
    }
}

fn find_date(
    lower: &str,
    today: NaiveDate,
    expr: &str,
) -> Result<Option<NaiveDate>, NormalizeError> {
    let out_of_range = || NormalizeError::OutOfRange(expr.to_string());

    if let Some(caps) = ISO_DATE.captures(lower) {
        let year: i32 = caps[1].parse().map_err(|_| out_of_range())?;
        let month: u32 = caps[2].parse().map_err(|_| out_of_range())?;
        let day: u32 = caps[3].parse().map_err(|_| out_of_range())?;
        return NaiveDate::from_ymd_opt(year, month, day)
            .map(Some)
            .ok_or_else(out_of_range);
    }

    if DAY_AFTER_TOMORROW.is_match(lower) {
        return Ok(Some(today + Duration::days(2)));
    }
    if TOMORROW.is_match(lower) {
        return Ok(Some(today + Duration::days(1)));
    }
    if TODAY.is_match(lower) {
        return Ok(Some(today));
    }

    if let Some(caps) = RELATIVE_DAYS.captures(lower) {
        let amount: i64 = caps[1].parse().map_err(|_| out_of_range())?;
        let days = if caps[2].starts_with('w') {
            amount * 7
        } else {
            amount
        };
        return Ok(Some(today + Duration::days(days)));
    }

    if let Some(caps) = WEEKDAY.captures(lower) {
        let weekday = parse_weekday(&caps[2]).ok_or_else(out_of_range)?;
        let allow_today = caps.get(1).map(|m| m.as_str()) == Some("this");
        return Ok(Some(next_weekday(today, weekday, allow_today)));
    }

    if NEXT_WEEK.is_match(lower) {
        return Ok(Some(today + Duration::days(7)));
    }

    if let Some(caps) = MONTH_DAY.captures(lower) {
        let month = parse_month(&caps[1]).ok_or_else(out_of_range)?;
        let day: u32 = caps[2].parse().map_err(|_| out_of_range())?;
        let year = caps.get(3).map(|m| m.as_str());
        return resolve_month_day(today, month, day, year).map(Some).ok_or_else(out_of_range);
    }

    if let Some(caps) = DAY_MONTH.captures(lower) {
        let day: u32 = caps[1].parse().map_err(|_| out_of_range())?;
        let month = parse_month(&caps[2]).ok_or_else(out_of_range)?;
        let year = caps.get(3).map(|m| m.as_str());
        return resolve_month_day(today, month, day, year).map(Some).ok_or_else(out_of_range);
    }

    Ok(None)
}

fn find_time(lower: &str, expr: &str) -> Result<Option<NaiveTime>, NormalizeError> {
    let out_of_range = || NormalizeError::OutOfRange(expr.to_string());

    if NOON.is_match(lower) {
        return Ok(NaiveTime::from_hms_opt(12, 0, 0));
    }
    if MIDNIGHT.is_match(lower) {
        return Ok(NaiveTime::from_hms_opt(0, 0, 0));
    }
    if END_OF_DAY.is_match(lower) {
        return Ok(NaiveTime::from_hms_opt(23, 59, 0));
    }

    if let Some(caps) = TWELVE_HOUR.captures(lower) {
        let hour: u32 = caps[1].parse().map_err(|_| out_of_range())?;
        let minute: u32 = match caps.get(2) {
            Some(m) => m.as_str().parse().map_err(|_| out_of_range())?,
            None => 0,
        };
        if !(1..=12).contains(&hour) {
            return Err(out_of_range());
        }
        let is_pm = caps[3].starts_with('p');
        let hour = match (hour, is_pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
        return NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Some)
            .ok_or_else(out_of_range);
    }

    if let Some(caps) = TWENTY_FOUR_HOUR.captures(lower) {
        let hour: u32 = caps[1].parse().map_err(|_| out_of_range())?;
        let minute: u32 = caps[2].parse().map_err(|_| out_of_range())?;
        return NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Some)
            .ok_or_else(out_of_range);
    }

    if let Some(caps) = AT_HOUR.captures(lower) {
        let hour: u32 = caps[1].parse().map_err(|_| out_of_range())?;
        return NaiveTime::from_hms_opt(hour, 0, 0)
            .map(Some)
            .ok_or_else(out_of_range);
    }

    Ok(None)
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    match name {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Next occurrence of `weekday`. A bare or `next` weekday never means today;
/// `this <weekday>` does when today is that day.
fn next_weekday(today: NaiveDate, weekday: Weekday, allow_today: bool) -> NaiveDate {
    let current = today.weekday().num_days_from_monday() as i64;
    let wanted = weekday.num_days_from_monday() as i64;
    let mut ahead = (wanted - current).rem_euclid(7);
    if ahead == 0 && !allow_today {
        ahead = 7;
    }
    today + Duration::days(ahead)
}

fn parse_month(name: &str) -> Option<u32> {
    let month = match name.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// A month/day without a year is the next such date on or after today.
fn resolve_month_day(
    today: NaiveDate,
    month: u32,
    day: u32,
    year: Option<&str>,
) -> Option<NaiveDate> {
    if let Some(year) = year {
        return NaiveDate::from_ymd_opt(year.parse().ok()?, month, day);
    }
    let this_year = NaiveDate::from_ymd_opt(today.year(), month, day)?;
    if this_year >= today {
        Some(this_year)
    } else {
        NaiveDate::from_ymd_opt(today.year() + 1, month, day)
    }
}

// =============================================================================
// Serde helpers
// =============================================================================

/// Serialize a `NaiveDateTime` in canonical form. Deserialization accepts
/// anything [`normalize`] accepts as an absolute timestamp.
pub mod canonical {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_canonical(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_absolute(s.trim())
            .map(super::truncate_to_minute)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}', expected YYYY-MM-DDTHH:mm", s)))
    }
}

/// Optional variant of [`canonical`].
pub mod canonical_option {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        dt: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => serializer.serialize_some(&super::format_canonical(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let s: Option<String> = Option::deserialize(deserializer)?;
        match s {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => super::parse_absolute(s.trim())
                .map(super::truncate_to_minute)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", s))),
        }
    }
}
