//! Allocation of the daily hour budget across tickets. Hours and percentage are two views of the
//! same quantity: whichever one is written, the other is derived from it before control returns.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::{
    error::EngineError,
    settings::{AutoDistribution, StatusList},
    utils::percentage::{portion_of, share_percentage},
};

use super::{eligibility::classify, ticket::Ticket};

/// Budget changes smaller than this are treated as noise from the input field.
pub const BUDGET_EPSILON: f64 = 0.01;

/// Tickets of one session plus the budget they share.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationState {
    tickets: Vec<Ticket>,
    total_budget_hours: f64,
    initial_distribution: HashMap<String, f64>,
}

impl AllocationState {
    pub fn new(tickets: Vec<Ticket>, total_budget_hours: f64) -> Self {
        Self {
            tickets,
            total_budget_hours: sanitize(total_budget_hours),
            initial_distribution: HashMap::new(),
        }
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn total_budget_hours(&self) -> f64 {
        self.total_budget_hours
    }

    pub fn total_allocated_hours(&self) -> f64 {
        self.tickets.iter().map(|v| v.allocated_hours).sum()
    }

    /// Replaces the tickets, typically after a new fetch. Allocations and the reset snapshot
    /// belong to the old tickets and are dropped.
    pub fn replace_tickets(&mut self, tickets: Vec<Ticket>) {
        self.tickets = tickets;
        self.initial_distribution.clear();
    }

    /// Negative input counts as zero.
    pub fn set_ticket_hours(&mut self, index: usize, hours: f64) -> Result<(), EngineError> {
        let budget = self.total_budget_hours;
        let ticket = self.ticket_mut(index)?;
        ticket.allocated_hours = sanitize(hours);
        ticket.allocated_percentage = share_percentage(ticket.allocated_hours, budget);
        debug!(
            "Set {} to {}h ({}%)",
            ticket.key, ticket.allocated_hours, ticket.allocated_percentage
        );
        Ok(())
    }

    /// The percentage is kept as given, hours follow from the current budget.
    pub fn set_ticket_percentage(&mut self, index: usize, percentage: f64) -> Result<(), EngineError> {
        let budget = self.total_budget_hours;
        let ticket = self.ticket_mut(index)?;
        ticket.allocated_percentage = sanitize(percentage);
        ticket.allocated_hours = portion_of(ticket.allocated_percentage, budget);
        debug!(
            "Set {} to {}% ({}h)",
            ticket.key, ticket.allocated_percentage, ticket.allocated_hours
        );
        Ok(())
    }

    /// Rescales every allocation so its percentage survives the budget change, then makes the
    /// rescaled hours the new reset target. Returns whether anything changed.
    pub fn set_total_budget(&mut self, new_budget: f64) -> bool {
        let new_budget = sanitize(new_budget);
        if (new_budget - self.total_budget_hours).abs() <= BUDGET_EPSILON {
            return false;
        }

        info!("Total budget {}h -> {}h", self.total_budget_hours, new_budget);
        self.total_budget_hours = new_budget;
        for ticket in self.tickets.iter_mut() {
            ticket.allocated_hours = portion_of(ticket.allocated_percentage, new_budget);
        }
        self.capture_initial_distribution();
        true
    }

    /// Clears every allocation and splits the budget evenly over the tickets `mode` selects.
    /// Estimates play no part in the split. [AutoDistribution::None] only clears, the reset
    /// snapshot stays what it was.
    pub fn auto_distribute(&mut self, mode: AutoDistribution, primary_statuses: &StatusList, today: NaiveDate) {
        for ticket in self.tickets.iter_mut() {
            ticket.allocated_hours = 0.;
            ticket.allocated_percentage = 0.;
        }

        let eligible = match mode {
            AutoDistribution::None => {
                debug!("Cleared allocations of {} tickets", self.tickets.len());
                return;
            }
            AutoDistribution::All => (0..self.tickets.len()).collect::<Vec<_>>(),
            AutoDistribution::ActiveWork => self
                .tickets
                .iter()
                .enumerate()
                .filter(|(_, ticket)| classify(ticket, primary_statuses, today).is_active())
                .map(|(index, _)| index)
                .collect(),
        };

        if !eligible.is_empty() {
            let budget = self.total_budget_hours;
            let share = budget / eligible.len() as f64;
            for index in eligible.iter().copied() {
                let ticket = &mut self.tickets[index];
                ticket.allocated_hours = share;
                ticket.allocated_percentage = share_percentage(share, budget);
            }
        }

        info!(
            "Distributed {}h across {} of {} tickets using {mode}",
            self.total_budget_hours,
            eligible.len(),
            self.tickets.len()
        );
        self.capture_initial_distribution();
    }

    /// Restores the hours captured by the last distribution or budget change. Tickets missing
    /// from the snapshot go back to zero.
    pub fn reset(&mut self) {
        let budget = self.total_budget_hours;
        for ticket in self.tickets.iter_mut() {
            ticket.allocated_hours = self
                .initial_distribution
                .get(&ticket.key)
                .copied()
                .unwrap_or(0.);
            ticket.allocated_percentage = share_percentage(ticket.allocated_hours, budget);
        }
    }

    fn capture_initial_distribution(&mut self) {
        self.initial_distribution = self
            .tickets
            .iter()
            .map(|v| (v.key.clone(), v.allocated_hours))
            .collect();
    }

    fn ticket_mut(&mut self, index: usize) -> Result<&mut Ticket, EngineError> {
        let len = self.tickets.len();
        self.tickets
            .get_mut(index)
            .ok_or(EngineError::IndexOutOfRange { index, len })
    }
}

/// Negative, NaN and infinite values count as zero.
fn sanitize(value: f64) -> f64 {
    if !value.is_finite() {
        0.
    } else {
        value.max(0.)
    }
}
