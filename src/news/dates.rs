//! Loose date parsing for upstream feeds
//!
//! News search results and registry records disagree wildly on date
//! formats: RFC 3339 timestamps, bare dates, month-precision dates
//! ("2024-06"), US-style "June 5, 2024", and relative phrases like
//! "2 days ago". Everything funnels through one forgiving parser; a
//! string nothing matches is reported as unparseable rather than
//! guessed at.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// Sentinel stored in place of a date that could not be parsed.
pub const DATE_NOT_FOUND: &str = "date not found";

/// Parse the date strings that show up across news and registry feeds.
///
/// `now` anchors relative phrases ("3 hours ago") so callers can pin it
/// in tests. Returns `None` when no known format matches.
pub fn parse_loose_date(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(DATE_NOT_FOUND) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    // Offset-free timestamps, e.g. "2025-06-01T10:30:00.123456".
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.and_utc());
        }
    }

    for format in ["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return start_of_day(date);
        }
    }

    // Month-precision registry dates land on the first of the month.
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d") {
        return start_of_day(date);
    }
    for format in ["%B %Y %d", "%b %Y %d"] {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{} 1", trimmed), format) {
            return start_of_day(date);
        }
    }

    parse_relative(&trimmed.to_lowercase(), now)
}

/// True when `parsed` is no older than `window_days` before `now`.
///
/// Future dates pass: registry records legitimately carry start dates
/// ahead of today.
pub fn within_window(parsed: DateTime<Utc>, now: DateTime<Utc>, window_days: i64) -> bool {
    now.signed_duration_since(parsed) <= Duration::days(window_days)
}

fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
}

fn parse_relative(lower: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match lower {
        "yesterday" => return Some(now - Duration::days(1)),
        "today" | "just now" => return Some(now),
        _ => {}
    }

    let mut parts = lower.split_whitespace();
    let count = match parts.next()? {
        "a" | "an" => 1,
        n => n.parse::<i64>().ok()?,
    };
    let unit = parts.next()?;
    if parts.next() != Some("ago") || parts.next().is_some() {
        return None;
    }

    let delta = match unit.trim_end_matches('s') {
        "minute" | "min" => Duration::minutes(count),
        "hour" => Duration::hours(count),
        "day" => Duration::days(count),
        "week" => Duration::weeks(count),
        "month" => Duration::days(count * 30),
        "year" => Duration::days(count * 365),
        _ => return None,
    };
    Some(now - delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parses_rfc3339() {
        let parsed = parse_loose_date("2025-06-01T10:30:00+00:00", anchor()).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 6, 1, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_parses_offset_free_timestamp() {
        assert!(parse_loose_date("2025-06-01T10:30:00", anchor()).is_some());
        assert!(parse_loose_date("2025-06-01T10:30:00.123456", anchor()).is_some());
    }

    #[test]
    fn test_parses_plain_and_us_dates() {
        let day = Utc.with_ymd_and_hms(2025, 6, 5, 0, 0, 0).unwrap();
        assert_eq!(parse_loose_date("2025-06-05", anchor()), Some(day));
        assert_eq!(parse_loose_date("June 5, 2025", anchor()), Some(day));
        assert_eq!(parse_loose_date("Jun 5, 2025", anchor()), Some(day));
        assert_eq!(parse_loose_date("06/05/2025", anchor()), Some(day));
    }

    #[test]
    fn test_parses_month_precision() {
        let first = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_loose_date("2024-06", anchor()), Some(first));
        assert_eq!(parse_loose_date("June 2024", anchor()), Some(first));
    }

    #[test]
    fn test_parses_relative_phrases() {
        let now = anchor();
        assert_eq!(parse_loose_date("2 days ago", now), Some(now - Duration::days(2)));
        assert_eq!(parse_loose_date("1 week ago", now), Some(now - Duration::weeks(1)));
        assert_eq!(parse_loose_date("3 hours ago", now), Some(now - Duration::hours(3)));
        assert_eq!(parse_loose_date("an hour ago", now), Some(now - Duration::hours(1)));
        assert_eq!(parse_loose_date("yesterday", now), Some(now - Duration::days(1)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_loose_date("", anchor()).is_none());
        assert!(parse_loose_date("date not found", anchor()).is_none());
        assert!(parse_loose_date("sometime soon", anchor()).is_none());
        assert!(parse_loose_date("2024", anchor()).is_none());
    }

    #[test]
    fn test_window_keeps_recent_and_future() {
        let now = anchor();
        assert!(within_window(now - Duration::days(30), now, 365));
        assert!(within_window(now + Duration::days(90), now, 365));
        assert!(!within_window(now - Duration::days(400), now, 365));
    }
}
