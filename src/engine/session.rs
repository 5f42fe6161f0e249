//! One logging session. The front-end sends intents, the session applies them to its
//! [AllocationState] and answers with everything needed to redraw.
//!
//! Fetching and editing never overlap: while a fetch is outstanding the session is
//! [SessionPhase::Loading] and refuses edits, so a late fetch result can't silently replace
//! allocations the user made in the meantime.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{error::EngineError, settings::{AutoDistribution, StatusList}};

use super::{
    capacity::{check_overage, CapacityReport},
    distribution::AllocationState,
    eligibility::{classify, EligibilityReason},
    ticket::Ticket,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionCommand {
    EditHours { index: usize, hours: f64 },
    EditPercentage { index: usize, percentage: f64 },
    SetTotalBudget(f64),
    AutoDistribute(AutoDistribution),
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Ready,
}

/// Display data for a single ticket.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub reason: EligibilityReason,
    pub hours: f64,
    pub percentage: f64,
    pub original_estimate_hours: f64,
    pub time_spent_hours: f64,
    pub remaining_hours: f64,
    pub capacity: CapacityReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSummary {
    pub total_budget_hours: f64,
    pub total_allocated_hours: f64,
    /// Negative when more hours are allocated than budgeted.
    pub remaining_hours: f64,
    pub total_estimated_hours: f64,
    pub total_logged_hours: f64,
    /// Allocated tickets whose entry would exceed the original estimate.
    pub overage_count: usize,
    pub can_submit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub tickets: Vec<TicketView>,
    pub summary: AllocationSummary,
}

pub struct Session {
    state: AllocationState,
    phase: SessionPhase,
    primary_statuses: StatusList,
    today: NaiveDate,
}

impl Session {
    /// A new session waits for its first fetch.
    pub fn new(total_budget_hours: f64, primary_statuses: StatusList, today: NaiveDate) -> Self {
        Self {
            state: AllocationState::new(vec![], total_budget_hours),
            phase: SessionPhase::Loading,
            primary_statuses,
            today,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> &AllocationState {
        &self.state
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Marks a fetch as outstanding. Edits are refused until [load](Self::load) or
    /// [abort_refresh](Self::abort_refresh).
    pub fn begin_refresh(&mut self) {
        self.phase = SessionPhase::Loading;
    }

    /// Installs freshly fetched tickets and seeds them with the automatic distribution.
    pub fn load(&mut self, tickets: Vec<Ticket>, mode: AutoDistribution) -> SessionView {
        self.state.replace_tickets(tickets);
        self.state
            .auto_distribute(mode, &self.primary_statuses, self.today);
        self.phase = SessionPhase::Ready;
        self.view()
    }

    /// The fetch failed, previous tickets stay as they were.
    pub fn abort_refresh(&mut self) {
        self.phase = SessionPhase::Ready;
    }

    pub fn apply(&mut self, command: SessionCommand) -> Result<SessionView, EngineError> {
        if self.phase == SessionPhase::Loading {
            return Err(EngineError::FetchInProgress);
        }

        match command {
            SessionCommand::EditHours { index, hours } => self.state.set_ticket_hours(index, hours)?,
            SessionCommand::EditPercentage { index, percentage } => {
                self.state.set_ticket_percentage(index, percentage)?
            }
            SessionCommand::SetTotalBudget(hours) => {
                self.state.set_total_budget(hours);
            }
            SessionCommand::AutoDistribute(mode) => {
                self.state
                    .auto_distribute(mode, &self.primary_statuses, self.today)
            }
            SessionCommand::Reset => self.state.reset(),
        }
        Ok(self.view())
    }

    pub fn view(&self) -> SessionView {
        let tickets = self
            .state
            .tickets()
            .iter()
            .map(|ticket| TicketView {
                key: ticket.key.clone(),
                summary: ticket.summary.clone(),
                status: ticket.status.clone(),
                reason: classify(ticket, &self.primary_statuses, self.today),
                hours: ticket.allocated_hours(),
                percentage: ticket.allocated_percentage(),
                original_estimate_hours: ticket.original_estimate_hours,
                time_spent_hours: ticket.time_spent_hours,
                remaining_hours: ticket.remaining_or_derived(),
                capacity: check_overage(ticket, ticket.allocated_hours()),
            })
            .collect::<Vec<_>>();

        let total_allocated_hours = self.state.total_allocated_hours();
        let summary = AllocationSummary {
            total_budget_hours: self.state.total_budget_hours(),
            total_allocated_hours,
            remaining_hours: self.state.total_budget_hours() - total_allocated_hours,
            total_estimated_hours: tickets.iter().map(|v| v.original_estimate_hours).sum(),
            total_logged_hours: tickets.iter().map(|v| v.time_spent_hours).sum(),
            overage_count: tickets
                .iter()
                .filter(|v| v.hours > 0. && v.capacity.exceeds)
                .count(),
            can_submit: self.phase == SessionPhase::Ready && total_allocated_hours > 0.,
        };

        SessionView { tickets, summary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    fn tickets() -> Vec<Ticket> {
        vec![
            Ticket::new("WL-1", "Build", "In Progress").with_estimates(4., 3., 1.),
            Ticket::new("WL-2", "Review", "In Progress").with_estimates(10., 0., 10.),
        ]
    }

    #[test]
    fn test_edits_refused_while_loading() {
        let mut session = Session::new(6., StatusList::parse("In Progress"), today());
        assert_eq!(
            session.apply(SessionCommand::Reset),
            Err(EngineError::FetchInProgress)
        );

        session.load(tickets(), AutoDistribution::None);
        session.begin_refresh();
        assert_eq!(
            session.apply(SessionCommand::EditHours { index: 0, hours: 1. }),
            Err(EngineError::FetchInProgress)
        );
        assert!(!session.view().summary.can_submit);

        session.abort_refresh();
        assert!(session.apply(SessionCommand::EditHours { index: 0, hours: 1. }).is_ok());
    }

    #[test]
    fn test_load_seeds_distribution() {
        let mut session = Session::new(6., StatusList::parse("In Progress"), today());
        let view = session.load(tickets(), AutoDistribution::ActiveWork);

        assert_eq!(session.phase(), SessionPhase::Ready);
        assert_eq!(view.tickets[0].hours, 3.);
        assert_eq!(view.tickets[0].reason, EligibilityReason::ActiveWork);
        assert!(view.tickets[0].capacity.exceeds);
        assert_eq!(view.summary.overage_count, 1);
        assert_eq!(view.summary.total_estimated_hours, 14.);
        assert_eq!(view.summary.total_logged_hours, 3.);
        assert_eq!(view.summary.remaining_hours, 0.);
        assert!(view.summary.can_submit);
    }

    #[test]
    fn test_intents_update_view() -> anyhow::Result<()> {
        let mut session = Session::new(6., StatusList::default(), today());
        session.load(tickets(), AutoDistribution::None);

        let view = session.apply(SessionCommand::EditPercentage {
            index: 1,
            percentage: 50.,
        })?;
        assert_eq!(view.tickets[1].hours, 3.);
        assert_eq!(view.summary.remaining_hours, 3.);

        let view = session.apply(SessionCommand::SetTotalBudget(8.))?;
        assert_eq!(view.tickets[1].hours, 4.);

        let view = session.apply(SessionCommand::EditHours { index: 1, hours: 9. })?;
        assert_eq!(view.summary.remaining_hours, -1.);

        let view = session.apply(SessionCommand::Reset)?;
        assert_eq!(view.tickets[1].hours, 4.);

        let view = session.apply(SessionCommand::AutoDistribute(AutoDistribution::All))?;
        assert_eq!(view.tickets[0].hours, 4.);
        assert_eq!(view.tickets[1].hours, 4.);

        assert_eq!(
            session.apply(SessionCommand::EditHours { index: 2, hours: 1. }),
            Err(EngineError::IndexOutOfRange { index: 2, len: 2 })
        );
        Ok(())
    }
}
