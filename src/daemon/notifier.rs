use anyhow::Result;
use chrono::{DateTime, Local};
use tracing::info;

/// Shows the daily reminder to the user.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send {
    fn remind(&mut self, at: DateTime<Local>) -> Result<()>;
}

/// Writes reminders into the daemon log. The reminder flag it accompanies is what
/// `worklogger status` reports.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn remind(&mut self, at: DateTime<Local>) -> Result<()> {
        info!("Time to log your daily work hours! ({}) Run `worklogger log`.", at.format("%x %H:%M"));
        Ok(())
    }
}
