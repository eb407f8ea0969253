//! Marker timestamp parsing.
//!
//! Canonical string forms:
//! - Current: `2026/09/06 12:00:00 UTC` (slash-separated, zone name suffix)
//! - Legacy: `2026-09-06-12-00-00-UTC` (all-dash, rewritten before parsing)
//!
//! Parsing is deliberately lenient: markers come from tag values written by
//! several generations of policies, so a handful of date/time layouts and
//! both zone-name and numeric-offset suffixes are accepted. A value that
//! fits none of them is a parse error for the caller to downgrade.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::MarkError;

/// A parsed marker timestamp.
///
/// Timestamps that carry a zone (name or numeric offset) normalize to UTC;
/// zone-less ones stay naive and are compared in the local frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParsedInstant {
    Aware(DateTime<Utc>),
    Naive(NaiveDateTime),
}

/// Shorthand zone names accepted in filter configuration and timestamp
/// suffixes, resolved ahead of the full IANA table.
static TZ_ALIASES: Lazy<HashMap<&'static str, Tz>> = Lazy::new(|| {
    HashMap::from([
        ("utc", Tz::UTC),
        ("gmt", Tz::GMT),
        ("est", Tz::America__New_York),
        ("edt", Tz::America__New_York),
        ("cst", Tz::America__Chicago),
        ("cdt", Tz::America__Chicago),
        ("mst", Tz::America__Denver),
        ("mdt", Tz::America__Denver),
        ("pst", Tz::America__Los_Angeles),
        ("pdt", Tz::America__Los_Angeles),
        ("bst", Tz::Europe__London),
        ("cet", Tz::Europe__Berlin),
    ])
});

const OFFSET_FORMATS: &[&str] = &[
    "%Y/%m/%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%dT%H:%M:%S%z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %H:%M",
    // Minute/second split by a space, as produced by the legacy rewrite.
    "%Y/%m/%d %H:%M %S",
    "%Y-%m-%d %H:%M %S",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%Y-%m-%d"];

/// Resolve a timezone name, trying the alias table before the IANA database.
pub fn resolve_tz(name: &str) -> Option<Tz> {
    if let Some(tz) = TZ_ALIASES.get(name.to_lowercase().as_str()) {
        return Some(*tz);
    }
    name.parse::<Tz>().ok()
}

/// Parse a marker timestamp, falling back to the legacy all-dash rewrite
/// when the raw string fits no known layout.
pub fn parse_marker_timestamp(raw: &str) -> Result<ParsedInstant, MarkError> {
    parse_flexible(raw).or_else(|_| parse_flexible(&legacy_rewrite(raw)))
}

/// Parse a timestamp string in any of the accepted layouts.
pub fn parse_flexible(raw: &str) -> Result<ParsedInstant, MarkError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(MarkError::TimestampParse(raw.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(ParsedInstant::Aware(dt.with_timezone(&Utc)));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(ParsedInstant::Aware(dt.with_timezone(&Utc)));
        }
    }

    if let Some((head, tz)) = split_zone_suffix(s) {
        if let Some(naive) = parse_naive(head) {
            if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
                return Ok(ParsedInstant::Aware(dt.with_timezone(&Utc)));
            }
        }
    }

    if let Some(naive) = parse_naive(s) {
        return Ok(ParsedInstant::Naive(naive));
    }

    Err(MarkError::TimestampParse(raw.to_string()))
}

/// Rewrite a legacy all-dash timestamp into a parseable layout: the 3rd
/// `-` becomes a space, then the 3rd `-` of the result becomes `:`, then
/// the 3rd `-` of that becomes a space. A string with fewer dashes passes
/// through the remaining steps unchanged.
pub(crate) fn legacy_rewrite(s: &str) -> String {
    let s = replace_nth(s, '-', ' ', 3);
    let s = replace_nth(&s, '-', ':', 3);
    replace_nth(&s, '-', ' ', 3)
}

fn replace_nth(s: &str, old: char, new: char, n: usize) -> String {
    match s.char_indices().filter(|&(_, c)| c == old).nth(n - 1) {
        Some((idx, _)) => {
            let mut out = String::with_capacity(s.len());
            out.push_str(&s[..idx]);
            out.push(new);
            out.push_str(&s[idx + old.len_utf8()..]);
            out
        }
        None => s.to_string(),
    }
}

/// Split off a trailing zone name (` UTC`, `-UTC`, ` America/Oslo`, ...).
fn split_zone_suffix(s: &str) -> Option<(&str, Tz)> {
    let idx = s.rfind(|c| c == ' ' || c == '-')?;
    let head = s[..idx].trim_end();
    if head.is_empty() {
        return None;
    }
    let tz = resolve_tz(&s[idx + 1..])?;
    Some((head, tz))
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    None
}
