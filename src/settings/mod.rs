//! Settings are stored as a flat key-value JSON document, `settings.json`, using the same keys
//! the options form writes. [RawSettings] mirrors that document field by field, [Settings] is the
//! validated view the rest of the application works with.

pub mod store;

use std::{fmt::Display, str::FromStr};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_TOTAL_HOURS: f64 = 6.;
/// Upper bound for a day's budget.
pub const MAX_DAILY_HOURS: f64 = 24.;
pub const DEFAULT_WORKLOG_COMMENT: &str = "Daily work log";
pub const DEFAULT_NOTIFICATION_TIME: NaiveTime = match NaiveTime::from_hms_opt(17, 0, 0) {
    Some(v) => v,
    None => panic!("17:00 is a valid time"),
};

/// Every settings key in the order they are shown.
pub const SETTINGS_KEYS: [&str; 12] = [
    "jiraUrl",
    "username",
    "apiToken",
    "projectKey",
    "defaultHours",
    "autoDistribution",
    "primaryStatuses",
    "otherStatuses",
    "customJql",
    "notificationTime",
    "weekendsEnabled",
    "worklogComment",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_distribution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_statuses: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_statuses: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_jql: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekends_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worklog_comment: Option<String>,
}

impl RawSettings {
    /// Updates one key from user input. Values are validated here so that a broken value never
    /// reaches the store.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let text = || (!value.is_empty()).then(|| value.to_string());
        match key {
            "jiraUrl" => self.jira_url = text().map(|v| normalize_tracker_url(&v)),
            "username" => self.username = text(),
            "apiToken" => self.api_token = text(),
            "projectKey" => self.project_key = text(),
            "defaultHours" => {
                self.default_hours = match text() {
                    Some(v) => Some(parse_hours(&v)?),
                    None => None,
                }
            }
            "autoDistribution" => {
                if let Some(v) = text() {
                    v.parse::<AutoDistribution>()?;
                }
                self.auto_distribution = text();
            }
            "primaryStatuses" => self.primary_statuses = text(),
            "otherStatuses" => self.other_statuses = text(),
            "customJql" => self.custom_jql = text(),
            "notificationTime" => {
                if let Some(v) = text() {
                    parse_notification_time(&v)?;
                }
                self.notification_time = text();
            }
            "weekendsEnabled" => {
                self.weekends_enabled = match text() {
                    Some(v) => Some(v.parse::<bool>().map_err(|e| ConfigError::Invalid {
                        key: "weekendsEnabled",
                        reason: e.to_string(),
                    })?),
                    None => None,
                }
            }
            "worklogComment" => self.worklog_comment = text(),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Value of a key as it would be typed into `set`. Secrets are masked.
    pub fn display_value(&self, key: &str) -> Option<String> {
        match key {
            "jiraUrl" => self.jira_url.clone(),
            "username" => self.username.clone(),
            "apiToken" => self.api_token.as_ref().map(|_| "********".to_string()),
            "projectKey" => self.project_key.clone(),
            "defaultHours" => self.default_hours.map(|v| v.to_string()),
            "autoDistribution" => self.auto_distribution.clone(),
            "primaryStatuses" => self.primary_statuses.clone(),
            "otherStatuses" => self.other_statuses.clone(),
            "customJql" => self.custom_jql.clone(),
            "notificationTime" => self.notification_time.clone(),
            "weekendsEnabled" => self.weekends_enabled.map(|v| v.to_string()),
            "worklogComment" => self.worklog_comment.clone(),
            _ => None,
        }
    }
}

/// How hours are spread when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoDistribution {
    #[default]
    None,
    All,
    ActiveWork,
}

impl FromStr for AutoDistribution {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "none" => Ok(AutoDistribution::None),
            "all" => Ok(AutoDistribution::All),
            "activeWork" => Ok(AutoDistribution::ActiveWork),
            other => Err(ConfigError::Invalid {
                key: "autoDistribution",
                reason: format!("expected one of none, all, activeWork but got {other}"),
            }),
        }
    }
}

impl Display for AutoDistribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AutoDistribution::None => write!(f, "none"),
            AutoDistribution::All => write!(f, "all"),
            AutoDistribution::ActiveWork => write!(f, "activeWork"),
        }
    }
}

/// Comma separated list of status names. Matching ignores case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusList(Vec<String>);

impl StatusList {
    pub fn parse(value: &str) -> Self {
        StatusList(
            value
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn contains(&self, status: &str) -> bool {
        let status = status.trim().to_lowercase();
        self.0.iter().any(|v| v.to_lowercase() == status)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Opaque credentials passed through to the tracker.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub base_url: String,
    pub username: String,
    pub api_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Everything the ticket query needs besides credentials.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSettings {
    pub project_key: String,
    pub primary_statuses: StatusList,
    pub custom_jql: Option<String>,
}

/// When the reminder daemon nags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderSchedule {
    pub time: NaiveTime,
    pub weekends_enabled: bool,
}

impl Default for ReminderSchedule {
    fn default() -> Self {
        Self {
            time: DEFAULT_NOTIFICATION_TIME,
            weekends_enabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    jira_url: Option<String>,
    username: Option<String>,
    api_token: Option<String>,
    project_key: Option<String>,
    pub default_hours: f64,
    pub auto_distribution: AutoDistribution,
    pub primary_statuses: StatusList,
    pub custom_jql: Option<String>,
    pub schedule: ReminderSchedule,
    pub worklog_comment: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jira_url: None,
            username: None,
            api_token: None,
            project_key: None,
            default_hours: DEFAULT_TOTAL_HOURS,
            auto_distribution: AutoDistribution::None,
            primary_statuses: StatusList::default(),
            custom_jql: None,
            schedule: ReminderSchedule::default(),
            worklog_comment: DEFAULT_WORKLOG_COMMENT.to_string(),
        }
    }
}

impl TryFrom<RawSettings> for Settings {
    type Error = ConfigError;

    fn try_from(raw: RawSettings) -> Result<Self, Self::Error> {
        let non_blank = |v: Option<String>| v.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let default_hours = match raw.default_hours {
            Some(v) if is_daily_hours(v) => v,
            Some(v) => {
                return Err(ConfigError::Invalid {
                    key: "defaultHours",
                    reason: format!("{v} is not between 0 and {MAX_DAILY_HOURS} hours"),
                })
            }
            None => DEFAULT_TOTAL_HOURS,
        };

        let auto_distribution = match non_blank(raw.auto_distribution) {
            Some(v) => v.parse()?,
            None => AutoDistribution::default(),
        };

        let time = match non_blank(raw.notification_time) {
            Some(v) => parse_notification_time(&v)?,
            None => DEFAULT_NOTIFICATION_TIME,
        };

        Ok(Settings {
            jira_url: non_blank(raw.jira_url).map(|v| normalize_tracker_url(&v)),
            username: non_blank(raw.username),
            api_token: non_blank(raw.api_token),
            project_key: non_blank(raw.project_key),
            default_hours,
            auto_distribution,
            primary_statuses: StatusList::parse(raw.primary_statuses.as_deref().unwrap_or_default()),
            custom_jql: non_blank(raw.custom_jql),
            schedule: ReminderSchedule {
                time,
                weekends_enabled: raw.weekends_enabled.unwrap_or(false),
            },
            worklog_comment: non_blank(raw.worklog_comment)
                .unwrap_or_else(|| DEFAULT_WORKLOG_COMMENT.to_string()),
        })
    }
}

impl Settings {
    /// Fails with the first missing key.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        Ok(Credentials {
            base_url: self.jira_url.clone().ok_or(ConfigError::Missing("jiraUrl"))?,
            username: self.username.clone().ok_or(ConfigError::Missing("username"))?,
            api_token: self.api_token.clone().ok_or(ConfigError::Missing("apiToken"))?,
        })
    }

    pub fn filter(&self) -> Result<FilterSettings, ConfigError> {
        Ok(FilterSettings {
            project_key: self
                .project_key
                .clone()
                .ok_or(ConfigError::Missing("projectKey"))?,
            primary_statuses: self.primary_statuses.clone(),
            custom_jql: self.custom_jql.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.jira_url.is_some() && self.api_token.is_some()
    }

    pub fn tracker_url(&self) -> Option<&str> {
        self.jira_url.as_deref()
    }
}

/// Prepends `https://` when no scheme was given and drops one trailing slash.
pub fn normalize_tracker_url(value: &str) -> String {
    let value = value.trim();
    let with_scheme = if value.starts_with("http") {
        value.to_string()
    } else {
        format!("https://{value}")
    };
    with_scheme
        .strip_suffix('/')
        .map(str::to_string)
        .unwrap_or(with_scheme)
}

fn parse_hours(value: &str) -> Result<f64, ConfigError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| is_daily_hours(*v))
        .ok_or_else(|| ConfigError::Invalid {
            key: "defaultHours",
            reason: format!("{value} is not between 0 and {MAX_DAILY_HOURS} hours"),
        })
}

/// A finite amount of hours that fits into one day.
pub fn is_daily_hours(value: f64) -> bool {
    value.is_finite() && (0. ..=MAX_DAILY_HOURS).contains(&value)
}

fn parse_notification_time(value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|e| ConfigError::Invalid {
        key: "notificationTime",
        reason: format!("expected HH:MM, {e}"),
    })
}
