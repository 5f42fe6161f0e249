use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Date format understood by tracker queries, `2025-03-15`.
pub fn query_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Timestamp format the tracker expects for worklog start times.
pub fn tracker_timestamp(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%S.000%z").to_string()
}

/// Parses timestamps like `2025-03-15T10:42:11.000+0200`. RFC 3339 is accepted as well.
pub fn parse_tracker_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
}
