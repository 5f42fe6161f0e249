use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    settings::{store::SettingsStore, ReminderSchedule},
    utils::clock::Clock,
};

use super::{
    fire_reminder, notifier::Notifier, reminder_state::ReminderStateStore, schedule::next_reminder,
};

/// Fires the daily reminder and repeats snoozed ones. Settings are re-read on every poll so a
/// changed notification time takes effect without a restart.
pub struct ReminderModule {
    settings: Box<dyn SettingsStore>,
    state: ReminderStateStore,
    notifier: Box<dyn Notifier>,
    shutdown: CancellationToken,
    poll_interval: Duration,
    clock: Box<dyn Clock>,
    schedule: Option<ReminderSchedule>,
    next: Option<DateTime<Local>>,
}

impl ReminderModule {
    pub fn new(
        settings: Box<dyn SettingsStore>,
        state: ReminderStateStore,
        notifier: Box<dyn Notifier>,
        shutdown: CancellationToken,
        poll_interval: Duration,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            state,
            notifier,
            shutdown,
            poll_interval,
            clock,
            schedule: None,
            next: None,
        }
    }

    /// Upcoming scheduled reminder, known after the first poll.
    pub fn next_reminder(&self) -> Option<DateTime<Local>> {
        self.next
    }

    /// Checks once whether a reminder is due and fires it. Returns whether it fired.
    pub async fn tick(&mut self) -> Result<bool> {
        let now = self.clock.time();
        let local_now = now.with_timezone(&Local);

        let schedule = match self.settings.load().await {
            Ok(settings) => settings.schedule,
            Err(e) => {
                warn!("Couldn't read settings, keeping previous schedule {e:?}");
                self.schedule.unwrap_or_default()
            }
        };
        if self.schedule != Some(schedule) {
            let next = next_reminder(&local_now, &schedule);
            info!("Next work log reminder set for {}", next.format("%x %H:%M"));
            self.schedule = Some(schedule);
            self.next = Some(next);
        }

        let scheduled = self.next.is_some_and(|next| next <= local_now);
        let snoozed = self.state.load().await?.snooze_due(now);
        if !scheduled && !snoozed {
            return Ok(false);
        }

        debug!("Firing reminder, scheduled: {scheduled}, snoozed: {snoozed}");
        fire_reminder(&self.state, self.notifier.as_mut(), now).await?;
        // A failed attempt keeps the reminder due for the next poll.
        if scheduled {
            self.next = Some(next_reminder(&local_now, &schedule));
        }
        Ok(true)
    }

    /// Executes the reminder loop until shutdown.
    pub async fn run(mut self) -> Result<()> {
        loop {
            if let Err(e) = self.tick().await {
                error!("Encountered an error while checking reminders {e:?}");
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.clock.sleep(self.poll_interval) => ()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        path::Path,
        sync::{Arc, Mutex},
    };

    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use crate::{
        daemon::notifier::MockNotifier,
        settings::store::FileSettingsStore,
        utils::logging::TEST_LOGGING,
    };

    use super::*;

    #[derive(Clone)]
    struct SteppingClock(Arc<Mutex<DateTime<Utc>>>);

    impl SteppingClock {
        fn set(&self, time: DateTime<Utc>) {
            *self.0.lock().unwrap() = time;
        }
    }

    #[async_trait]
    impl Clock for SteppingClock {
        fn time(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }

        async fn sleep(&self, duration: Duration) {
            tokio::time::sleep(duration).await;
        }
    }

    fn local(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(2025, 3, day, hour, minute, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    async fn module(dir: &Path, notifier: MockNotifier, clock: SteppingClock) -> Result<ReminderModule> {
        let settings = FileSettingsStore::new(dir);
        let mut raw = settings.get().await?;
        raw.set("notificationTime", "17:00")?;
        settings.set(&raw).await?;

        Ok(ReminderModule::new(
            Box::new(settings),
            ReminderStateStore::new(dir),
            Box::new(notifier),
            CancellationToken::new(),
            Duration::from_millis(10),
            Box::new(clock),
        ))
    }

    #[tokio::test]
    async fn test_fires_once_at_scheduled_time() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let clock = SteppingClock(Arc::new(Mutex::new(local(12, 9, 0))));
        let mut notifier = MockNotifier::new();
        notifier.expect_remind().times(1).returning(|_| Ok(()));
        let mut module = module(dir.path(), notifier, clock.clone()).await?;

        assert!(!module.tick().await?);
        assert_eq!(
            module.next_reminder().map(|v| v.with_timezone(&Utc)),
            Some(local(12, 17, 0))
        );

        clock.set(local(12, 17, 1));
        assert!(module.tick().await?);
        assert!(ReminderStateStore::new(dir.path()).load().await?.reminder_active);
        assert_eq!(
            module.next_reminder().map(|v| v.with_timezone(&Utc)),
            Some(local(13, 17, 0))
        );

        clock.set(local(12, 17, 30));
        assert!(!module.tick().await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_reminder_is_retried() -> Result<()> {
        let dir = tempdir()?;
        let clock = SteppingClock(Arc::new(Mutex::new(local(12, 9, 0))));
        let mut notifier = MockNotifier::new();
        let mut sequence = mockall::Sequence::new();
        notifier
            .expect_remind()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Err(anyhow::anyhow!("notification service unavailable")));
        notifier
            .expect_remind()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));
        let mut module = module(dir.path(), notifier, clock.clone()).await?;

        assert!(!module.tick().await?);
        clock.set(local(12, 17, 1));
        assert!(module.tick().await.is_err());
        assert_eq!(
            module.next_reminder().map(|v| v.with_timezone(&Utc)),
            Some(local(12, 17, 0))
        );
        assert!(!ReminderStateStore::new(dir.path()).load().await?.reminder_active);

        clock.set(local(12, 17, 2));
        assert!(module.tick().await?);
        assert_eq!(
            module.next_reminder().map(|v| v.with_timezone(&Utc)),
            Some(local(13, 17, 0))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_snoozed_reminder_repeats() -> Result<()> {
        let dir = tempdir()?;
        let clock = SteppingClock(Arc::new(Mutex::new(local(12, 9, 0))));
        let mut notifier = MockNotifier::new();
        notifier.expect_remind().times(1).returning(|_| Ok(()));
        let mut module = module(dir.path(), notifier, clock.clone()).await?;

        let state = ReminderStateStore::new(dir.path());
        state
            .snooze(local(12, 9, 0), chrono::Duration::minutes(30))
            .await?;

        clock.set(local(12, 9, 20));
        assert!(!module.tick().await?);

        clock.set(local(12, 9, 31));
        assert!(module.tick().await?);
        assert_eq!(state.load().await?.snoozed_until, None);
        Ok(())
    }

    #[tokio::test]
    async fn smoke_test_reminder_loop() -> Result<()> {
        let dir = tempdir()?;
        let clock = SteppingClock(Arc::new(Mutex::new(local(12, 9, 0))));
        let mut notifier = MockNotifier::new();
        notifier.expect_remind().never();
        let module = module(dir.path(), notifier, clock).await?;
        let shutdown = module.shutdown.clone();

        let (result, _) = tokio::join!(module.run(), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            shutdown.cancel();
        });
        result
    }
}
