//! Lenient scalar coercions for query-string values.
//!
//! Every function returns `None` rather than an error: the query language is a
//! read-only filter DSL, so a malformed value simply imposes no constraint.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

static NUMERIC_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").expect("static regex")
});

/// Parses the leading numeric prefix of `raw` (`"12abc"` is 12, `"abc"` is nothing).
#[must_use]
pub fn to_number(raw: &str) -> Option<f64> {
    let m = NUMERIC_PREFIX.find(raw)?;
    m.as_str().trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Empty input is no constraint; `false`, `no` and `0` are false; anything else is true.
#[must_use]
pub fn to_boolean(raw: &str) -> Option<bool> {
    if raw.is_empty() {
        return None;
    }
    Some(!matches!(raw, "false" | "no" | "0"))
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS` (UTC) or a bare `YYYY-MM-DD` (UTC midnight).
#[must_use]
pub fn to_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0)).map(|n| n.and_utc())
}

/// Local wall-clock rendering used in audit lines, e.g. `2024-02-01T09:30:00.042`.
#[must_use]
pub fn stringify_date(date: DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

/// Converts a limit/skip value: non-negative integers only.
pub(crate) fn to_count(raw: &str) -> Option<usize> {
    let n = to_number(raw)?;
    if n < 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(n.trunc() as usize)
}
