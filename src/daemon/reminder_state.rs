//! The pending-reminder flag shared between the daemon and the CLI. It stands in for a badge:
//! the daemon raises it, opening a session or submitting work clears it.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::fs::json_file::{read_json, write_json};

pub const REMINDER_FILE: &str = "reminder.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderState {
    #[serde(default)]
    pub reminder_active: bool,
    #[serde(default)]
    pub reminder_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub snoozed_until: Option<DateTime<Utc>>,
}

impl ReminderState {
    /// A snoozed reminder that should fire at `now`.
    pub fn snooze_due(&self, now: DateTime<Utc>) -> bool {
        self.snoozed_until.is_some_and(|until| until <= now)
    }
}

pub struct ReminderStateStore {
    path: PathBuf,
}

impl ReminderStateStore {
    pub fn new(app_dir: &Path) -> Self {
        Self {
            path: app_dir.join(REMINDER_FILE),
        }
    }

    pub async fn load(&self) -> Result<ReminderState> {
        read_json(&self.path).await
    }

    /// Raises the flag. Any pending snooze is consumed.
    pub async fn activate(&self, at: DateTime<Utc>) -> Result<()> {
        let state = ReminderState {
            reminder_active: true,
            reminder_time: Some(at),
            snoozed_until: None,
        };
        write_json(&self.path, &state).await
    }

    /// Asks for the reminder to be repeated after `delay`.
    pub async fn snooze(&self, now: DateTime<Utc>, delay: Duration) -> Result<DateTime<Utc>> {
        let mut state = self.load().await?;
        let until = now + delay;
        state.snoozed_until = Some(until);
        write_json(&self.path, &state).await?;
        info!("Reminder snoozed until {until}");
        Ok(until)
    }

    /// The `clearReminders` message: drops the flag and any pending snooze.
    pub async fn clear(&self) -> Result<()> {
        let state = self.load().await?;
        if state == ReminderState::default() {
            return Ok(());
        }
        write_json(&self.path, &ReminderState::default()).await?;
        info!("Cleared reminder alerts");
        Ok(())
    }
}
