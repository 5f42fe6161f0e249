use std::fmt::Display;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::settings::StatusList;

use super::ticket::{Ticket, TicketOrigin};

/// Why a ticket belongs in today's log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EligibilityReason {
    /// Status is one of the primary statuses.
    ActiveWork,
    /// Updated today.
    ActiveToday,
    /// Only present because the fallback query was used.
    FallbackOrigin,
    /// The query returned it but nothing explains why.
    Unclassified,
}

impl EligibilityReason {
    /// Tickets with these reasons receive hours in the `activeWork` distribution.
    pub fn is_active(self) -> bool {
        matches!(self, EligibilityReason::ActiveWork | EligibilityReason::ActiveToday)
    }
}

impl Display for EligibilityReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EligibilityReason::ActiveWork => write!(f, "Active Work"),
            EligibilityReason::ActiveToday => write!(f, "Active Today"),
            EligibilityReason::FallbackOrigin => write!(f, "Fallback Query"),
            EligibilityReason::Unclassified => write!(f, "Check Logic"),
        }
    }
}

/// Rules apply in order: primary status, updated today, fallback origin.
pub fn classify(ticket: &Ticket, primary_statuses: &StatusList, today: NaiveDate) -> EligibilityReason {
    if primary_statuses.contains(&ticket.status) {
        EligibilityReason::ActiveWork
    } else if ticket.updated_on(today) {
        EligibilityReason::ActiveToday
    } else if ticket.origin == TicketOrigin::Fallback {
        EligibilityReason::FallbackOrigin
    } else {
        warn!(
            "Ticket {} with status {:?} returned without activity today. Updated: {:?}",
            ticket.key, ticket.status, ticket.updated_at
        );
        EligibilityReason::Unclassified
    }
}
