use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

/// Which query produced the ticket. Only explains the ticket's presence, never changes how hours
/// are allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TicketOrigin {
    Primary,
    Fallback,
}

/// One issue of the current session. Tracker fields are fixed after the fetch, the allocation
/// pair is owned by [AllocationState](super::distribution::AllocationState).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub updated_at: Option<DateTime<FixedOffset>>,
    pub original_estimate_hours: f64,
    pub time_spent_hours: f64,
    pub remaining_estimate_hours: f64,
    pub origin: TicketOrigin,
    pub(crate) allocated_hours: f64,
    pub(crate) allocated_percentage: f64,
}

impl Ticket {
    pub fn new(key: impl Into<String>, summary: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            summary: summary.into(),
            status: status.into(),
            updated_at: None,
            original_estimate_hours: 0.,
            time_spent_hours: 0.,
            remaining_estimate_hours: 0.,
            origin: TicketOrigin::Primary,
            allocated_hours: 0.,
            allocated_percentage: 0.,
        }
    }

    pub fn with_updated_at(self, updated_at: DateTime<FixedOffset>) -> Self {
        self.with_updated_at_opt(Some(updated_at))
    }

    pub fn with_updated_at_opt(self, updated_at: Option<DateTime<FixedOffset>>) -> Self {
        Self { updated_at, ..self }
    }

    pub fn with_estimates(self, original: f64, spent: f64, remaining: f64) -> Self {
        Self {
            original_estimate_hours: original,
            time_spent_hours: spent,
            remaining_estimate_hours: remaining,
            ..self
        }
    }

    pub fn with_origin(self, origin: TicketOrigin) -> Self {
        Self { origin, ..self }
    }

    pub fn allocated_hours(&self) -> f64 {
        self.allocated_hours
    }

    pub fn allocated_percentage(&self) -> f64 {
        self.allocated_percentage
    }

    /// The tracker's remaining estimate, or original minus spent when the tracker has none.
    pub fn remaining_or_derived(&self) -> f64 {
        if self.remaining_estimate_hours > 0. {
            self.remaining_estimate_hours
        } else {
            self.original_estimate_hours - self.time_spent_hours
        }
    }

    /// Whether the last remote update happened on `day`, judged by the date the tracker wrote.
    pub fn updated_on(&self, day: NaiveDate) -> bool {
        self.updated_at.is_some_and(|v| v.date_naive() == day)
    }
}

/// Converts tracker time fields, which are seconds, into hours. Absent values count as zero.
pub fn seconds_to_hours(seconds: Option<i64>) -> f64 {
    seconds.map_or(0., |v| v as f64 / 3600.)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_seconds_to_hours() {
        assert_eq!(seconds_to_hours(Some(5400)), 1.5);
        assert_eq!(seconds_to_hours(None), 0.);
    }

    #[test]
    fn test_remaining_falls_back_to_difference() {
        let ticket = Ticket::new("WL-1", "a", "To Do").with_estimates(5., 2., 0.);
        assert_eq!(ticket.remaining_or_derived(), 3.);
        let ticket = ticket.with_estimates(5., 2., 1.);
        assert_eq!(ticket.remaining_or_derived(), 1.);
    }

    #[test]
    fn test_updated_on_uses_tracker_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let ticket = Ticket::new("WL-1", "a", "To Do")
            .with_updated_at(offset.with_ymd_and_hms(2025, 3, 15, 0, 30, 0).unwrap());
        assert!(ticket.updated_on(NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()));
        assert!(!ticket.updated_on(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()));
        assert!(!Ticket::new("WL-2", "b", "To Do").updated_on(NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()));
    }
}
