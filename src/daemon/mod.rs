use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use notifier::{LogNotifier, Notifier};
use reminder::ReminderModule;
use reminder_state::ReminderStateStore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    settings::store::{FileSettingsStore, SettingsStore},
    utils::clock::{Clock, DefaultClock},
};

pub mod args;
pub mod notifier;
pub mod reminder;
pub mod reminder_state;
pub mod schedule;
pub mod shutdown;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Represents the starting point for the daemon
pub async fn start_daemon(dir: PathBuf) -> Result<()> {
    let shutdown_token = CancellationToken::new();

    let reminder = create_reminder(
        &dir,
        Box::new(FileSettingsStore::new(&dir)),
        LogNotifier,
        &shutdown_token,
        DefaultClock,
    );

    info!("Reminder daemon started in {dir:?}");
    let (_, reminder_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        reminder.run(),
    );

    if let Err(reminder_result) = reminder_result {
        error!("Reminder module got an error {:?}", reminder_result);
    }

    Ok(())
}

/// Shows a reminder and raises the pending flag.
pub async fn fire_reminder(
    state: &ReminderStateStore,
    notifier: &mut dyn Notifier,
    now: DateTime<Utc>,
) -> Result<()> {
    notifier.remind(now.with_timezone(&Local))?;
    state.activate(now).await
}

fn create_reminder(
    dir: &std::path::Path,
    settings: Box<dyn SettingsStore>,
    notifier: impl Notifier + 'static,
    shutdown_token: &CancellationToken,
    clock: impl Clock,
) -> ReminderModule {
    ReminderModule::new(
        settings,
        ReminderStateStore::new(dir),
        Box::new(notifier),
        shutdown_token.clone(),
        DEFAULT_POLL_INTERVAL,
        Box::new(clock),
    )
}
