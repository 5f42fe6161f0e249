//! Wire shapes of the tracker's REST API. Time fields arrive in seconds.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    engine::ticket::{seconds_to_hours, Ticket, TicketOrigin},
    utils::time::parse_tracker_timestamp,
};

/// Fields requested for every search.
pub const SEARCH_FIELDS: [&str; 8] = [
    "key",
    "summary",
    "status",
    "assignee",
    "updated",
    "timeoriginalestimate",
    "timespent",
    "timeestimate",
];

pub const SEARCH_MAX_RESULTS: u32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub jql: String,
    pub max_results: u32,
    pub fields: Vec<String>,
}

impl SearchRequest {
    pub fn new(jql: impl Into<String>) -> Self {
        Self {
            jql: jql.into(),
            max_results: SEARCH_MAX_RESULTS,
            fields: SEARCH_FIELDS.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// The same request as URL query parameters.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("jql", self.jql.clone()),
            ("maxResults", self.max_results.to_string()),
            ("fields", self.fields.join(",")),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub issues: Vec<RawIssue>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawIssue {
    pub key: String,
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub status: Option<IssueStatus>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub timeoriginalestimate: Option<i64>,
    #[serde(default)]
    pub timespent: Option<i64>,
    #[serde(default)]
    pub timeestimate: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IssueStatus {
    pub name: String,
}

impl RawIssue {
    /// Normalizes the issue into a [Ticket] with an empty allocation.
    pub fn into_ticket(self, origin: TicketOrigin) -> Ticket {
        let RawIssue { key, fields } = self;
        let updated_at = fields.updated.as_deref().and_then(|value| {
            let parsed = parse_tracker_timestamp(value);
            if parsed.is_none() {
                warn!("Ticket {key} has an unreadable update time {value:?}");
            }
            parsed
        });

        Ticket::new(
            key,
            fields.summary,
            fields.status.map(|v| v.name).unwrap_or_default(),
        )
        .with_estimates(
            seconds_to_hours(fields.timeoriginalestimate),
            seconds_to_hours(fields.timespent),
            seconds_to_hours(fields.timeestimate),
        )
        .with_origin(origin)
        .with_updated_at_opt(updated_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogRequest {
    pub time_spent_seconds: i64,
    pub comment: String,
    pub started: String,
}

/// The authenticated user, used to check a connection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Myself {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email_address: Option<String>,
}
