use tracing::{error, info, instrument};

use crate::{
    engine::ticket::Ticket,
    error::{SubmissionError, TrackerError},
    utils::{clock::Clock, time::tracker_timestamp},
};

use super::{entities::WorklogRequest, TrackerApi};

/// Sends one worklog per allocated ticket.
pub struct WorklogSubmitter<'a, T: TrackerApi + ?Sized> {
    tracker: &'a T,
    comment: &'a str,
    clock: &'a dyn Clock,
}

impl<'a, T: TrackerApi + ?Sized> WorklogSubmitter<'a, T> {
    pub fn new(tracker: &'a T, comment: &'a str, clock: &'a dyn Clock) -> Self {
        Self {
            tracker,
            comment,
            clock,
        }
    }

    /// Submits tickets with hours, one at a time and in order, stopping at the first failure.
    /// Entries accepted before a failure stay in the tracker; their keys are reported in the
    /// error. On success returns every submitted key.
    #[instrument(skip_all)]
    pub async fn submit_all(&self, tickets: &[Ticket]) -> Result<Vec<String>, SubmissionError> {
        let mut submitted = Vec::new();
        for ticket in tickets.iter().filter(|v| v.allocated_hours() > 0.) {
            match self.send(ticket).await {
                Ok(worklog) => {
                    info!("Logged {}s on {}", worklog.time_spent_seconds, ticket.key);
                    submitted.push(ticket.key.clone());
                }
                Err(cause) => {
                    error!("Failed to log work for {}: {cause}", ticket.key);
                    return Err(SubmissionError {
                        key: ticket.key.clone(),
                        cause,
                        submitted,
                    });
                }
            }
        }
        Ok(submitted)
    }

    async fn send(&self, ticket: &Ticket) -> Result<WorklogRequest, TrackerError> {
        let worklog = self.worklog_for(ticket)?;
        self.tracker.add_worklog(&ticket.key, &worklog).await?;
        Ok(worklog)
    }

    fn worklog_for(&self, ticket: &Ticket) -> Result<WorklogRequest, TrackerError> {
        let hours = ticket.allocated_hours();
        let seconds = (hours * 3600.).round();
        // `as` saturates, out of range values must not reach the tracker.
        if !seconds.is_finite() || seconds >= i64::MAX as f64 {
            return Err(TrackerError::InvalidWorklog(format!(
                "{hours} hours for {} is out of range",
                ticket.key
            )));
        }
        Ok(WorklogRequest {
            time_spent_seconds: seconds as i64,
            comment: format!("{} - {hours:.2} hours", self.comment),
            started: tracker_timestamp(self.clock.time()),
        })
    }
}
