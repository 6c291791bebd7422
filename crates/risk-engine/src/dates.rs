//! Publish-date parsing for heterogeneous feeds

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// Naive layouts tried after RFC 3339 / RFC 2822; all are read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y%m%dT%H%M%SZ", // GDELT seendate
    "%Y-%m-%d %H:%M:%S",
];

/// Parse a feed timestamp into UTC.
///
/// Returns `None` for empty or unrecognised input; callers treat that as
/// "date unknown" rather than an error.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Human-readable age label for audit rows ("3h ago", "Yesterday", ...)
pub fn relative_label(published: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(published) = published else {
        return "Unknown date".to_string();
    };

    let delta = now - published;
    let hours = delta.num_hours();
    let days = delta.num_days();

    if hours < 1 {
        "Just now".to_string()
    } else if hours < 6 {
        format!("{}h ago", hours)
    } else if hours < 24 {
        "Today".to_string()
    } else if days == 1 {
        "Yesterday".to_string()
    } else if days <= 6 {
        format!("{} days ago", days)
    } else if days <= 13 {
        "Last week".to_string()
    } else if days <= 20 {
        format!("{} days ago", days)
    } else {
        published.format("%b %d, %Y").to_string()
    }
}

/// True when `published` is older than the retention window.
/// Undated events are kept.
pub fn is_expired(published: Option<DateTime<Utc>>, now: DateTime<Utc>, retention_days: i64) -> bool {
    let Some(window) = Duration::try_days(retention_days) else {
        return false;
    };
    published.is_some_and(|p| now.signed_duration_since(p) > window)
}
