//! Error types shared by the engine, the tracker boundary and the settings layer.

use thiserror::Error;

/// Failures talking to the issue tracker.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackerError {
    #[error("could not reach the issue tracker: {0}")]
    Network(String),

    #[error("invalid credentials, check your username and API token")]
    Auth,

    #[error("issue tracker URL not found, check your tracker URL")]
    NotFound,

    #[error("the tracker rejected the query: {0}")]
    Query(String),

    #[error("the tracker does not allow this request method")]
    MethodNotAllowed,

    #[error("issue tracker responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed issue tracker response: {0}")]
    Malformed(String),

    #[error("refusing to send worklog: {0}")]
    InvalidWorklog(String),
}

impl TrackerError {
    /// Maps a non-success HTTP status into the matching error kind.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            400 => TrackerError::Query(body),
            401 => TrackerError::Auth,
            404 => TrackerError::NotFound,
            405 => TrackerError::MethodNotAllowed,
            status => TrackerError::Status { status, body },
        }
    }

    /// True for failures caused by the configured credentials or URL rather than connectivity.
    pub fn is_misconfiguration(&self) -> bool {
        matches!(self, TrackerError::Auth | TrackerError::NotFound)
    }
}

/// A worklog entry for `key` failed. Entries in `submitted` were already accepted by the tracker
/// and are not rolled back.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("failed to log work for {key}: {cause}")]
pub struct SubmissionError {
    pub key: String,
    #[source]
    pub cause: TrackerError,
    pub submitted: Vec<String>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("ticket index {index} is out of range, the session has {len} tickets")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("tickets are still being fetched, edits are accepted once the fetch settles")]
    FetchInProgress,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("missing {0} in settings. Run `worklogger config set {0} <value>`")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("unknown settings key {0}")]
    UnknownKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(TrackerError::from_status(400, "bad".into()), TrackerError::Query("bad".into()));
        assert_eq!(TrackerError::from_status(401, String::new()), TrackerError::Auth);
        assert_eq!(TrackerError::from_status(404, String::new()), TrackerError::NotFound);
        assert_eq!(
            TrackerError::from_status(405, String::new()),
            TrackerError::MethodNotAllowed
        );
        assert_eq!(
            TrackerError::from_status(503, "down".into()),
            TrackerError::Status {
                status: 503,
                body: "down".into()
            }
        );
    }

    #[test]
    fn test_misconfiguration_kinds() {
        assert!(TrackerError::Auth.is_misconfiguration());
        assert!(TrackerError::NotFound.is_misconfiguration());
        assert!(!TrackerError::Network("timeout".into()).is_misconfiguration());
    }
}
