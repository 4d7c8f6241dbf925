//! Durations and temporal values.
//!
//! Durations are integer milliseconds; schema authors write them as literals
//! (`1h`) or strings (`"30d"`). Temporal values are strings carrying either a
//! calendar date or a date-time, compared and shifted via their epoch
//! timestamp.
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(-?\d+)\s*(milliseconds?|seconds?|minutes?|hours?|days?|weeks?|ms|s|m|h|d|w)$",
    )
    .expect("Is a valid regex")
});

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum TemporalKind {
    Date,
    DateTime,
}

/// A parsed temporal string: its kind and its epoch timestamp in
/// milliseconds.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Temporal {
    pub(crate) kind: TemporalKind,
    pub(crate) timestamp_ms: i64,
}

impl Temporal {
    /// Render the shifted timestamp back in the representation the value
    /// came in with.
    pub(crate) fn format(kind: TemporalKind, timestamp_ms: i64) -> Option<String> {
        let datetime = DateTime::from_timestamp_millis(timestamp_ms)?.naive_utc();
        Some(match kind {
            TemporalKind::Date => datetime.format(DATE_FORMAT).to_string(),
            TemporalKind::DateTime => datetime.format(DATETIME_FORMAT).to_string(),
        })
    }
}

pub(crate) fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input, DATE_FORMAT).ok()
}

/// Permissive date-time parse: the engine's native `YYYY-MM-DD HH:MM:SS`
/// form, its `T`-separated variant, and RFC 3339.
pub(crate) fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(input, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(input)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

/// Interpret a value as temporal. Dates keep their own kind so that shifting
/// one yields a date again.
pub(crate) fn temporal(value: &Value) -> Option<Temporal> {
    parse_temporal(value.as_str()?)
}

pub(crate) fn parse_temporal(input: &str) -> Option<Temporal> {
    if let Some(date) = parse_date(input) {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(Temporal {
            kind: TemporalKind::Date,
            timestamp_ms: midnight.and_utc().timestamp_millis(),
        });
    }
    parse_datetime(input).map(|datetime| Temporal {
        kind: TemporalKind::DateTime,
        timestamp_ms: datetime.and_utc().timestamp_millis(),
    })
}

/// The permissive parse used for ordered string comparison: either kind,
/// reduced to its timestamp.
pub(crate) fn timestamp(input: &str) -> Option<i64> {
    parse_temporal(input).map(|t| t.timestamp_ms)
}

/// Coerce a value to a duration in milliseconds: integers as-is, integral
/// floats truncated, strings via the `<n><unit>` notation.
pub(crate) fn duration_ms(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i)
            } else if let Some(u) = n.as_u64() {
                i64::try_from(u).ok()
            } else {
                let f = n.as_f64()?;
                if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    Some(f as i64)
                } else {
                    None
                }
            }
        }
        Value::String(s) => parse_duration(s),
        _ => None,
    }
}

fn parse_duration(input: &str) -> Option<i64> {
    let captures = DURATION_RE.captures(input)?;
    let amount: i64 = captures[1].parse().ok()?;
    let scale = match captures[2].to_ascii_lowercase().as_str() {
        "ms" | "millisecond" | "milliseconds" => 1,
        "s" | "second" | "seconds" => 1_000,
        "m" | "minute" | "minutes" => 60_000,
        "h" | "hour" | "hours" => 3_600_000,
        "d" | "day" | "days" => 86_400_000,
        "w" | "week" | "weeks" => 604_800_000,
        _ => return None,
    };
    amount.checked_mul(scale)
}
