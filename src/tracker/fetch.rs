use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::{
    engine::ticket::{Ticket, TicketOrigin},
    error::TrackerError,
    settings::FilterSettings,
    utils::time::query_date,
};

use super::{
    entities::{RawIssue, SearchRequest},
    SearchMethod, TrackerApi,
};

/// Retrieves the candidate tickets for a day.
pub struct TicketFetcher<'a, T: TrackerApi + ?Sized> {
    tracker: &'a T,
}

impl<'a, T: TrackerApi + ?Sized> TicketFetcher<'a, T> {
    pub fn new(tracker: &'a T) -> Self {
        Self { tracker }
    }

    /// Runs the configured query, or the default one built from `filter`. A rejected query is
    /// retried once with [fallback_query], whose tickets are tagged [TicketOrigin::Fallback].
    /// If that fails too, the original error is returned.
    #[instrument(skip(self, filter))]
    pub async fn fetch(&self, filter: &FilterSettings, today: NaiveDate) -> Result<Vec<Ticket>, TrackerError> {
        let jql = filter
            .custom_jql
            .clone()
            .unwrap_or_else(|| primary_query(filter, today));
        debug!("Generated query: {jql}");

        let primary = SearchRequest::new(jql);
        let error = match self.search(&primary).await {
            Ok(issues) => {
                let tickets = into_tickets(issues, TicketOrigin::Primary);
                info!("Using main query results: {} tickets found", tickets.len());
                return Ok(tickets);
            }
            Err(error @ TrackerError::Query(_)) => error,
            Err(error) => return Err(error),
        };

        warn!("Main query was rejected, trying fallback query. Failed query: {}", primary.jql);
        let fallback = SearchRequest::new(fallback_query(&filter.project_key));
        match self.tracker.search(SearchMethod::Post, &fallback).await {
            Ok(response) => {
                let tickets = into_tickets(response.issues, TicketOrigin::Fallback);
                info!("Using fallback query results: {} tickets found", tickets.len());
                Ok(tickets)
            }
            Err(fallback_error) => {
                warn!("Fallback query failed as well: {fallback_error}");
                Err(error)
            }
        }
    }

    /// GET first, repeated as POST when the tracker doesn't allow GET.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawIssue>, TrackerError> {
        let response = match self.tracker.search(SearchMethod::Get, request).await {
            Err(TrackerError::MethodNotAllowed) => {
                info!("GET method not allowed, trying POST");
                self.tracker.search(SearchMethod::Post, request).await
            }
            other => other,
        }?;
        Ok(response.issues)
    }
}

fn into_tickets(issues: Vec<RawIssue>, origin: TicketOrigin) -> Vec<Ticket> {
    issues.into_iter().map(|v| v.into_ticket(origin)).collect()
}

/// Assigned to the current user in an open sprint, and either in a primary status or updated
/// today.
pub fn primary_query(filter: &FilterSettings, today: NaiveDate) -> String {
    let updated_today = format!("updated >= \"{}\"", query_date(today));
    let activity = if filter.primary_statuses.is_empty() {
        updated_today
    } else {
        let statuses = filter
            .primary_statuses
            .iter()
            .map(|v| format!("\"{v}\""))
            .collect::<Vec<_>>()
            .join(",");
        format!("status IN ({statuses}) OR {updated_today}")
    };
    format!(
        "assignee = currentUser() AND project = \"{}\" AND Sprint in openSprints() AND ({activity}) ORDER BY updated DESC",
        filter.project_key
    )
}

/// The primary query without status and date filters.
pub fn fallback_query(project_key: &str) -> String {
    format!(
        "assignee = currentUser() AND project = \"{project_key}\" AND Sprint in openSprints() ORDER BY updated DESC"
    )
}
