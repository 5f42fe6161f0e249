use chrono::{DateTime, Datelike, Duration, TimeZone, Weekday};

use crate::settings::ReminderSchedule;

/// First reminder strictly after `after`. Today's slot counts only if it hasn't passed yet, and
/// weekends are skipped unless enabled.
pub fn next_reminder<Tz: TimeZone>(after: &DateTime<Tz>, schedule: &ReminderSchedule) -> DateTime<Tz> {
    let mut day = after.date_naive();
    loop {
        let candidate = day.and_time(schedule.time);
        // DST gaps can remove a slot, in which case that day is skipped.
        if let Some(at) = after.timezone().from_local_datetime(&candidate).earliest() {
            if at > *after && (schedule.weekends_enabled || !is_weekend(at.weekday())) {
                return at;
            }
        }
        day += Duration::days(1);
    }
}

pub fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, Utc};

    use super::*;

    fn schedule(weekends_enabled: bool) -> ReminderSchedule {
        ReminderSchedule {
            time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            weekends_enabled,
        }
    }

    #[test]
    fn test_later_today() {
        // Wednesday
        let now = Utc.with_ymd_and_hms(2025, 3, 12, 9, 0, 0).unwrap();
        assert_eq!(
            next_reminder(&now, &schedule(false)),
            Utc.with_ymd_and_hms(2025, 3, 12, 17, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_passed_slot_moves_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2025, 3, 12, 17, 0, 0).unwrap();
        assert_eq!(
            next_reminder(&now, &schedule(false)),
            Utc.with_ymd_and_hms(2025, 3, 13, 17, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_skips_weekend() {
        // Friday evening
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 18, 0, 0).unwrap();
        assert_eq!(
            next_reminder(&now, &schedule(false)),
            Utc.with_ymd_and_hms(2025, 3, 17, 17, 0, 0).unwrap()
        );
        assert_eq!(
            next_reminder(&now, &schedule(true)),
            Utc.with_ymd_and_hms(2025, 3, 15, 17, 0, 0).unwrap()
        );
    }
}
