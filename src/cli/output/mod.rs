//! Terminal rendering for session views and ticket lists.

use std::fmt::{self, Display};

use ansi_term::{
    Colour::{Green, Red, Yellow},
    Style,
};

use crate::engine::{
    eligibility::EligibilityReason,
    session::{AllocationSummary, SessionView, TicketView},
};

const SUMMARY_WIDTH: usize = 40;

/// The ticket table followed by the allocation summary.
pub struct ViewDisplay<'a>(pub &'a SessionView);

impl Display for ViewDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", TicketTable(&self.0.tickets))?;
        writeln!(f)?;
        write!(f, "{}", SummaryDisplay(&self.0.summary))
    }
}

pub struct TicketTable<'a>(pub &'a [TicketView]);

impl Display for TicketTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}",
            Style::new().bold().paint(format!(
                "{:>3}  {:<12} {:>7} {:>5}  {:>7} {:>7} {:>7}  {:<15} {}",
                "#", "Key", "Hours", "Pct", "Est", "Logged", "Left", "Reason", "Summary"
            ))
        )?;
        for (position, ticket) in self.0.iter().enumerate() {
            writeln!(
                f,
                "{:>3}  {:<12} {:>7} {:>5}  {:>7} {:>7} {:>7}  {:<15} {}",
                position + 1,
                ticket.key,
                format_hours(ticket.hours),
                format!("{:.0}%", ticket.percentage),
                format_hours(ticket.original_estimate_hours),
                format_hours(ticket.time_spent_hours),
                format_hours(ticket.remaining_hours),
                paint_reason(ticket.reason),
                truncate(&ticket.summary, SUMMARY_WIDTH),
            )?;
            if ticket.hours > 0. && ticket.capacity.exceeds {
                writeln!(
                    f,
                    "     {}",
                    Red.paint(format!(
                        "{} over estimate by {}, {} logged in total",
                        ticket.key,
                        format_hours(ticket.capacity.overage_hours),
                        format_hours(ticket.capacity.total_after)
                    ))
                )?;
            }
        }
        Ok(())
    }
}

pub struct SummaryDisplay<'a>(pub &'a AllocationSummary);

impl Display for SummaryDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.0;
        let allocated = format!(
            "Allocated {} of {}",
            format_hours(summary.total_allocated_hours),
            format_hours(summary.total_budget_hours)
        );
        writeln!(f, "{}", Style::new().bold().paint(allocated))?;

        let remaining = format!("Remaining budget: {}", format_hours(summary.remaining_hours));
        if summary.remaining_hours < 0. {
            writeln!(f, "{}", Red.paint(remaining))?;
        } else {
            writeln!(f, "{remaining}")?;
        }
        writeln!(f, "Total estimated: {}", format_hours(summary.total_estimated_hours))?;
        writeln!(f, "Already logged: {}", format_hours(summary.total_logged_hours))?;
        if summary.overage_count > 0 {
            writeln!(
                f,
                "{}",
                Yellow.paint(format!(
                    "{} ticket(s) will exceed their estimates",
                    summary.overage_count
                ))
            )?;
        }
        Ok(())
    }
}

fn paint_reason(reason: EligibilityReason) -> String {
    let text = format!("{:<15}", reason.to_string());
    match reason {
        EligibilityReason::ActiveWork | EligibilityReason::ActiveToday => Green.paint(text).to_string(),
        EligibilityReason::FallbackOrigin => Yellow.paint(text).to_string(),
        EligibilityReason::Unclassified => text,
    }
}

/// Link to the ticket in the tracker's web UI.
pub fn browse_url(tracker_url: &str, key: &str) -> String {
    format!("{}/browse/{key}", tracker_url.trim_end_matches('/'))
}

pub fn format_hours(hours: f64) -> String {
    format!("{hours:.2}h")
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut truncated = value.chars().take(width - 1).collect::<String>();
        truncated.push('…');
        truncated
    }
}
