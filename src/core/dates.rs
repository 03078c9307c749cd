//! Date normalization - Canonicalizes stored payment dates into UTC.
//!
//! The servicing system writes loan dates as local-time strings in a fixed
//! UTC-5 offset, sometimes without any offset marker at all. This module
//! rewrites them into the canonical `YYYY-MM-DDTHH:MM:SS.sssZ` form. A
//! midnight timestamp marks the *end* of the due date, not its start, so
//! exact local midnights are reinterpreted as 23:59:59.999 before the
//! conversion. Normalization never fails past this boundary: anything that
//! does not parse is logged and passed through unchanged.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use tracing::warn;

/// The fixed local offset the servicing system writes in, seconds west of
/// UTC. The market this store serves has no daylight saving.
const LOCAL_OFFSET_WEST_SECS: i32 = 5 * 3600;

/// Textual marker for the local offset inside stored date strings.
pub const LOCAL_OFFSET_SUFFIX: &str = "-05:00";

fn local_offset() -> FixedOffset {
    FixedOffset::west_opt(LOCAL_OFFSET_WEST_SECS).expect("offset within +/-24h")
}

/// Converts a stored date string into canonical UTC form.
///
/// - Inputs already carrying the `Z` marker are returned byte-identical.
/// - Inputs in the fixed local offset get the midnight end-of-day rule,
///   then convert to UTC.
/// - Inputs with some other explicit offset convert to UTC as-is.
/// - Inputs with no offset marker are assumed to be local time and get the
///   midnight rule.
/// - Inputs that fail to parse are returned unchanged.
#[must_use]
pub fn normalize(raw: &str) -> String {
    if raw.ends_with('Z') {
        return raw.to_owned();
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        let adjusted = if parsed.offset() == &local_offset() {
            roll_midnight_to_day_end(parsed)
        } else {
            parsed
        };
        return format_utc(adjusted.with_timezone(&Utc));
    }

    if let Some(naive) = parse_naive(raw) {
        if let Some(localized) = naive.and_local_timezone(local_offset()).single() {
            let adjusted = roll_midnight_to_day_end(localized);
            return format_utc(adjusted.with_timezone(&Utc));
        }
    }

    warn!(value = raw, "unparseable date passed through unchanged");
    raw.to_owned()
}

/// Parses an offset-less date-time string, accepting bare dates the way the
/// servicing system occasionally stores them.
fn parse_naive(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Applies the end-of-day rule: an exact local midnight (subseconds ignored)
/// becomes 23:59:59.999 in the same offset.
fn roll_midnight_to_day_end(value: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let time = value.time();
    if time.hour() != 0 || time.minute() != 0 || time.second() != 0 {
        return value;
    }
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
        .and_then(|end| value.with_time(end).single())
        .unwrap_or(value)
}

fn format_utc(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Today's date in the fixed local offset, as `YYYY-MM-DD`. Due-date
/// selection happens in local time, not UTC.
#[must_use]
pub fn local_today() -> String {
    Utc::now()
        .with_timezone(&local_offset())
        .date_naive()
        .format("%Y-%m-%d")
        .to_string()
}

/// The UTC date `days` days ago, as `YYYY-MM-DD`.
#[must_use]
pub fn utc_day_days_ago(days: i64) -> String {
    (Utc::now() - chrono::Duration::days(days))
        .date_naive()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_input_is_returned_byte_identical() {
        let raw = "2025-08-01T14:30:00.000Z";
        assert_eq!(normalize(raw), raw);
    }

    #[test]
    fn local_midnight_rolls_to_end_of_day() {
        assert_eq!(
            normalize("2025-08-01T00:00:00-05:00"),
            "2025-08-02T04:59:59.999Z"
        );
    }

    #[test]
    fn local_afternoon_converts_without_rolling() {
        assert_eq!(
            normalize("2025-08-01T15:45:10-05:00"),
            "2025-08-01T20:45:10.000Z"
        );
    }

    #[test]
    fn offsetless_input_assumes_local_offset() {
        assert_eq!(
            normalize("2025-08-01T10:00:00"),
            "2025-08-01T15:00:00.000Z"
        );
    }

    #[test]
    fn offsetless_midnight_gets_both_rules() {
        assert_eq!(
            normalize("2025-08-01T00:00:00"),
            "2025-08-02T04:59:59.999Z"
        );
    }

    #[test]
    fn bare_date_is_treated_as_local_midnight() {
        assert_eq!(normalize("2025-08-01"), "2025-08-02T04:59:59.999Z");
    }

    #[test]
    fn foreign_offset_converts_without_midnight_rule() {
        assert_eq!(
            normalize("2025-08-01T00:00:00+02:00"),
            "2025-07-31T22:00:00.000Z"
        );
    }

    #[test]
    fn garbage_passes_through_unchanged() {
        assert_eq!(normalize("not a date"), "not a date");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize("2025-08-01T00:00:00-05:00");
        assert_eq!(normalize(&once), once);
    }
}
