use serde::Serialize;

use super::ticket::Ticket;

/// Outcome of comparing a proposed entry with the ticket's original estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityReport {
    pub exceeds: bool,
    pub overage_hours: f64,
    pub total_after: f64,
}

/// Would logging `proposed_hours` push the ticket past its original estimate? Tickets without an
/// estimate have no baseline and never exceed.
pub fn check_overage(ticket: &Ticket, proposed_hours: f64) -> CapacityReport {
    let total_after = ticket.time_spent_hours + proposed_hours;
    let estimate = ticket.original_estimate_hours;
    CapacityReport {
        exceeds: estimate > 0. && total_after > estimate,
        overage_hours: (total_after - estimate).max(0.),
        total_after,
    }
}
