use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Utc};

/// Represents an entity responsible for providing dates across application. This can allow it to
/// be used for testing
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;

    /// Calendar date of the user's working day.
    fn today(&self) -> NaiveDate {
        self.time().with_timezone(&Local).date_naive()
    }

    async fn sleep(&self, duration: Duration);
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock frozen at a single instant. Sleeping advances nothing, so loops driven by it must be
/// stopped through their cancellation token.
#[cfg(test)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
#[async_trait]
impl Clock for FixedClock {
    fn time(&self) -> DateTime<Utc> {
        self.0
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
