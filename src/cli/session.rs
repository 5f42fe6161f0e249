//! The `log` command: an interactive session over [Session] driven by line commands.

use std::{fmt::Display, str::FromStr};

use anyhow::{anyhow, bail, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info, warn};

use crate::{
    daemon::reminder_state::ReminderStateStore,
    engine::session::{Session, SessionCommand, SessionView},
    error::{EngineError, TrackerError},
    settings::{is_daily_hours, AutoDistribution, FilterSettings, Settings, MAX_DAILY_HOURS},
    tracker::{fetch::TicketFetcher, submit::WorklogSubmitter, TrackerApi},
    utils::{clock::Clock, percentage::Percentage},
};

use super::output::ViewDisplay;

/// Largest entry the prompt accepts for a single ticket.
pub const MAX_TICKET_HOURS: f64 = 12.;

pub const NO_TICKETS_MESSAGE: &str = "No active tickets found for today.";

pub const HELP: &str = "\
Commands:
  hours N H    set ticket N to H hours (0-12)
  pct N P      set ticket N to P percent of the total (0-100)
  total H      change the total hours (0-24), keeping proportions
  auto MODE    distribute hours again: none, all or activeWork
  reset        restore the distribution from the start of the session
  refresh      fetch tickets again
  show         print the tickets
  submit       log the hours to the tracker
  help         print this message
  quit         leave without logging";

/// One line typed at the prompt. Ticket numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReplCommand {
    Hours { ticket: usize, hours: f64 },
    Percentage { ticket: usize, percentage: f64 },
    Total(f64),
    Auto(AutoDistribution),
    Reset,
    Refresh,
    Show,
    Submit,
    Help,
    Quit,
}

impl FromStr for ReplCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let words = s.split_whitespace().collect::<Vec<_>>();
        let command = match words.as_slice() {
            ["hours" | "h", ticket, hours] => ReplCommand::Hours {
                ticket: parse_ticket(ticket)?,
                hours: parse_hours(hours)?.clamp(0., MAX_TICKET_HOURS),
            },
            ["pct" | "p", ticket, percentage] => ReplCommand::Percentage {
                ticket: parse_ticket(ticket)?,
                percentage: *parse_percentage(percentage)?.clamp_to(100.),
            },
            ["total" | "t", hours] => {
                ReplCommand::Total(parse_hours(hours)?.clamp(0., MAX_DAILY_HOURS))
            }
            ["auto" | "a", mode] => ReplCommand::Auto(mode.parse()?),
            ["reset"] => ReplCommand::Reset,
            ["refresh" | "r"] => ReplCommand::Refresh,
            ["show" | "s" | "ls"] => ReplCommand::Show,
            ["submit"] => ReplCommand::Submit,
            ["help" | "?"] => ReplCommand::Help,
            ["quit" | "q" | "exit"] => ReplCommand::Quit,
            [] => bail!("Empty command"),
            _ => bail!("Unknown command {s:?}, type help for the list of commands"),
        };
        Ok(command)
    }
}

fn parse_ticket(value: &str) -> Result<usize> {
    match value.parse::<usize>() {
        Ok(0) | Err(_) => Err(anyhow!("Ticket number must be a positive integer, got {value}")),
        Ok(v) => Ok(v),
    }
}

fn parse_hours(value: &str) -> Result<f64> {
    let hours = value
        .trim_end_matches('h')
        .parse::<f64>()
        .map_err(|e| anyhow!("Can't parse {value} into hours: {e}"))?;
    if !hours.is_finite() {
        bail!("Can't parse {value} into hours");
    }
    Ok(hours)
}

/// Value parser for `--total`. Out of range budgets are refused rather than clamped.
pub fn parse_total_hours(value: &str) -> Result<f64, String> {
    let hours = parse_hours(value).map_err(|e| e.to_string())?;
    if is_daily_hours(hours) {
        Ok(hours)
    } else {
        Err(format!("{value} is not between 0 and {MAX_DAILY_HOURS} hours"))
    }
}

fn parse_percentage(value: &str) -> Result<Percentage> {
    // A negative value is clamped rather than rejected, the same way hours are.
    if value.trim_start().starts_with('-') {
        return Ok(Percentage::default());
    }
    value.parse()
}

/// What the front-end should do after a command.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub done: bool,
}

impl Reply {
    fn text(text: impl Display) -> Self {
        Self {
            text: text.to_string(),
            done: false,
        }
    }

    fn done(text: impl Display) -> Self {
        Self {
            text: text.to_string(),
            done: true,
        }
    }
}

/// Everything a session needs from the outside world.
pub struct LogSession<'a> {
    tracker: &'a dyn TrackerApi,
    reminders: &'a ReminderStateStore,
    clock: &'a dyn Clock,
    filter: FilterSettings,
    mode: AutoDistribution,
    worklog_comment: String,
    session: Session,
}

impl<'a> LogSession<'a> {
    pub fn new(
        settings: &Settings,
        filter: FilterSettings,
        total_hours: f64,
        tracker: &'a dyn TrackerApi,
        reminders: &'a ReminderStateStore,
        clock: &'a dyn Clock,
    ) -> Self {
        let session = Session::new(total_hours, filter.primary_statuses.clone(), clock.today());
        Self {
            tracker,
            reminders,
            clock,
            filter,
            mode: settings.auto_distribution,
            worklog_comment: settings.worklog_comment.clone(),
            session,
        }
    }

    /// Overrides the distribution applied after every fetch.
    pub fn with_mode(mut self, mode: AutoDistribution) -> Self {
        self.mode = mode;
        self
    }

    pub fn view(&self) -> SessionView {
        self.session.view()
    }

    /// Opening a session clears the pending reminder and performs the first fetch.
    pub async fn start(&mut self) -> Reply {
        if let Err(e) = self.reminders.clear().await {
            warn!("Failed to clear reminders {e:?}");
        }
        self.refresh().await
    }

    pub async fn refresh(&mut self) -> Reply {
        self.session.begin_refresh();
        let fetched = TicketFetcher::new(self.tracker)
            .fetch(&self.filter, self.session.today())
            .await;
        match fetched {
            Ok(tickets) => {
                let view = self.session.load(tickets, self.mode);
                if view.tickets.is_empty() {
                    Reply::text(NO_TICKETS_MESSAGE)
                } else {
                    Reply::text(ViewDisplay(&view))
                }
            }
            Err(e) => {
                self.session.abort_refresh();
                error!("Failed to fetch tickets {e:?}");
                Reply::text(describe_tracker_error(&e))
            }
        }
    }

    pub async fn handle(&mut self, command: ReplCommand) -> Reply {
        let session_command = match command {
            ReplCommand::Hours { ticket, hours } => SessionCommand::EditHours {
                index: ticket - 1,
                hours,
            },
            ReplCommand::Percentage { ticket, percentage } => SessionCommand::EditPercentage {
                index: ticket - 1,
                percentage,
            },
            ReplCommand::Total(hours) => SessionCommand::SetTotalBudget(hours),
            ReplCommand::Auto(mode) => SessionCommand::AutoDistribute(mode),
            ReplCommand::Reset => SessionCommand::Reset,
            ReplCommand::Refresh => return self.refresh().await,
            ReplCommand::Show => return self.show(),
            ReplCommand::Submit => return self.submit().await,
            ReplCommand::Help => return Reply::text(HELP),
            ReplCommand::Quit => return Reply::done("Nothing was logged."),
        };

        match self.session.apply(session_command) {
            Ok(view) => Reply::text(ViewDisplay(&view)),
            Err(EngineError::IndexOutOfRange { index, len }) => Reply::text(format!(
                "There is no ticket {}, pick one between 1 and {len}",
                index + 1
            )),
            Err(e) => Reply::text(e),
        }
    }

    fn show(&self) -> Reply {
        let view = self.session.view();
        if view.tickets.is_empty() {
            Reply::text(NO_TICKETS_MESSAGE)
        } else {
            Reply::text(ViewDisplay(&view))
        }
    }

    async fn submit(&mut self) -> Reply {
        if !self.session.view().summary.can_submit {
            return Reply::text("Nothing to submit, allocate some hours first.");
        }

        let submitter = WorklogSubmitter::new(self.tracker, &self.worklog_comment, self.clock);
        match submitter.submit_all(self.session.state().tickets()).await {
            Ok(submitted) => {
                if let Err(e) = self.reminders.clear().await {
                    warn!("Failed to clear reminders {e:?}");
                }
                info!("Submitted work logs for {submitted:?}");
                Reply::done(format!("Logged work for {}.", submitted.join(", ")))
            }
            Err(e) => {
                let mut text = format!("Failed to log work for {}: {}", e.key, describe_tracker_error(&e.cause));
                if !e.submitted.is_empty() {
                    text.push_str(&format!(
                        "\nAlready logged, don't submit these again: {}",
                        e.submitted.join(", ")
                    ));
                }
                Reply::text(text)
            }
        }
    }

    /// Reads commands until `quit`, a successful submit or end of input.
    pub async fn run(mut self, input: impl AsyncBufRead + Unpin) -> Result<()> {
        println!("{}", self.start().await.text);
        println!("Type help for the list of commands.");

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let reply = match line.parse::<ReplCommand>() {
                Ok(command) => self.handle(command).await,
                Err(e) => Reply::text(e),
            };
            println!("{}", reply.text);
            if reply.done {
                break;
            }
        }
        Ok(())
    }
}

/// Distinguishes bad settings from connectivity problems.
pub fn describe_tracker_error(error: &TrackerError) -> String {
    match error {
        error if error.is_misconfiguration() => format!(
            "{error}. Check `worklogger config show` and fix it with `worklogger config set`."
        ),
        TrackerError::Network(_) => {
            format!("{error}. Check your network connection.")
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use mockall::predicate::{always, eq};
    use serde_json::json;
    use tempfile::tempdir;

    use crate::{
        settings::{RawSettings, StatusList},
        tracker::{entities::SearchResponse, MockTrackerApi, SearchMethod},
        utils::clock::FixedClock,
    };

    use super::*;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap())
    }

    fn settings() -> Settings {
        let mut raw = RawSettings::default();
        raw.set("autoDistribution", "activeWork").unwrap();
        raw.set("worklogComment", "Daily").unwrap();
        Settings::try_from(raw).unwrap()
    }

    fn filter() -> FilterSettings {
        FilterSettings {
            project_key: "WL".into(),
            primary_statuses: StatusList::parse("In Progress"),
            custom_jql: None,
        }
    }

    fn issues() -> SearchResponse {
        serde_json::from_value(json!({
            "issues": [
                {"key": "WL-1", "fields": {"summary": "Build", "status": {"name": "In Progress"}}},
                {"key": "WL-2", "fields": {"summary": "Review", "status": {"name": "In Progress"}}},
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "hours 2 3.5".parse::<ReplCommand>().unwrap(),
            ReplCommand::Hours {
                ticket: 2,
                hours: 3.5
            }
        );
        assert_eq!(
            "pct 1 40%".parse::<ReplCommand>().unwrap(),
            ReplCommand::Percentage {
                ticket: 1,
                percentage: 40.
            }
        );
        assert_eq!(
            "auto activeWork".parse::<ReplCommand>().unwrap(),
            ReplCommand::Auto(AutoDistribution::ActiveWork)
        );
        assert_eq!("  submit ".parse::<ReplCommand>().unwrap(), ReplCommand::Submit);
        assert!("hours 0 2".parse::<ReplCommand>().is_err());
        assert!("hours 1".parse::<ReplCommand>().is_err());
        assert!("dance".parse::<ReplCommand>().is_err());
        assert!("auto everything".parse::<ReplCommand>().is_err());
    }

    #[test]
    fn test_prompt_clamps_values() {
        assert_eq!(
            "hours 1 30".parse::<ReplCommand>().unwrap(),
            ReplCommand::Hours {
                ticket: 1,
                hours: MAX_TICKET_HOURS
            }
        );
        assert_eq!(
            "hours 1 -2".parse::<ReplCommand>().unwrap(),
            ReplCommand::Hours { ticket: 1, hours: 0. }
        );
        assert_eq!(
            "pct 1 150".parse::<ReplCommand>().unwrap(),
            ReplCommand::Percentage {
                ticket: 1,
                percentage: 100.
            }
        );
        assert_eq!(
            "pct 1 -5".parse::<ReplCommand>().unwrap(),
            ReplCommand::Percentage {
                ticket: 1,
                percentage: 0.
            }
        );
    }

    #[test]
    fn test_total_hours_bounds() {
        assert_eq!(parse_total_hours("7.5"), Ok(7.5));
        assert_eq!(parse_total_hours("8h"), Ok(8.));
        assert!(parse_total_hours("inf").is_err());
        assert!(parse_total_hours("NaN").is_err());
        assert!(parse_total_hours("1e300").is_err());
        assert!(parse_total_hours("-1").is_err());
        assert_eq!(
            "total 1e300".parse::<ReplCommand>().unwrap(),
            ReplCommand::Total(MAX_DAILY_HOURS)
        );
        assert!("total inf".parse::<ReplCommand>().is_err());
    }

    #[test]
    fn test_tracker_error_messages() {
        assert!(describe_tracker_error(&TrackerError::NotFound).contains("worklogger config show"));
        assert!(describe_tracker_error(&TrackerError::Network("refused".into()))
            .contains("network connection"));
    }

    #[tokio::test]
    async fn test_start_distributes_and_clears_reminder() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let reminders = ReminderStateStore::new(dir.path());
        reminders.activate(clock().0).await?;

        let mut tracker = MockTrackerApi::new();
        tracker
            .expect_search()
            .with(eq(SearchMethod::Get), always())
            .times(1)
            .returning(|_, _| Ok(issues()));
        let clock = clock();
        let mut session = LogSession::new(&settings(), filter(), 6., &tracker, &reminders, &clock);

        let reply = session.start().await;
        assert!(!reply.done);
        assert!(reply.text.contains("WL-1"));
        assert!(!reminders.load().await?.reminder_active);

        let hours = session
            .view()
            .tickets
            .iter()
            .map(|v| v.hours)
            .collect::<Vec<_>>();
        assert_eq!(hours, vec![3., 3.]);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_result_message() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let reminders = ReminderStateStore::new(dir.path());
        let mut tracker = MockTrackerApi::new();
        tracker
            .expect_search()
            .returning(|_, _| Ok(SearchResponse::default()));
        let clock = clock();
        let mut session = LogSession::new(&settings(), filter(), 6., &tracker, &reminders, &clock);

        assert_eq!(session.start().await.text, NO_TICKETS_MESSAGE);
        assert_eq!(
            session.handle(ReplCommand::Submit).await.text,
            "Nothing to submit, allocate some hours first."
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_auth_failure_is_reported_as_settings_problem() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let reminders = ReminderStateStore::new(dir.path());
        let mut tracker = MockTrackerApi::new();
        tracker
            .expect_search()
            .returning(|_, _| Err(TrackerError::Auth));
        let clock = clock();
        let mut session = LogSession::new(&settings(), filter(), 6., &tracker, &reminders, &clock);

        let reply = session.start().await;
        assert!(reply.text.contains("invalid credentials"));
        assert!(reply.text.contains("worklogger config set"));

        // The failed fetch settled the session, so edits are accepted.
        let reply = session
            .handle(ReplCommand::Hours { ticket: 1, hours: 1. })
            .await;
        assert_eq!(reply.text, "There is no ticket 1, pick one between 1 and 0");
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_then_submit() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let reminders = ReminderStateStore::new(dir.path());
        let mut tracker = MockTrackerApi::new();
        tracker.expect_search().returning(|_, _| Ok(issues()));
        tracker
            .expect_add_worklog()
            .withf(|key, worklog| {
                key == "WL-1"
                    && worklog.time_spent_seconds == 7200
                    && worklog.comment == "Daily - 2.00 hours"
            })
            .times(1)
            .returning(|_, _| Ok(()));
        tracker
            .expect_add_worklog()
            .withf(|key, worklog| key == "WL-2" && worklog.time_spent_seconds == 14400)
            .times(1)
            .returning(|_, _| Ok(()));
        let clock = clock();
        let mut session = LogSession::new(&settings(), filter(), 6., &tracker, &reminders, &clock);

        session.start().await;
        session
            .handle(ReplCommand::Hours { ticket: 1, hours: 2. })
            .await;
        session
            .handle(ReplCommand::Hours { ticket: 2, hours: 4. })
            .await;
        reminders.activate(clock.0).await?;

        let reply = session.handle(ReplCommand::Submit).await;
        assert_eq!(
            reply,
            Reply {
                text: "Logged work for WL-1, WL-2.".into(),
                done: true
            }
        );
        assert!(!reminders.load().await?.reminder_active);
        Ok(())
    }

    #[tokio::test]
    async fn test_partial_submission_lists_logged_tickets() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let reminders = ReminderStateStore::new(dir.path());
        let mut tracker = MockTrackerApi::new();
        tracker.expect_search().returning(|_, _| Ok(issues()));
        tracker
            .expect_add_worklog()
            .withf(|key, _| key == "WL-1")
            .returning(|_, _| Ok(()));
        tracker
            .expect_add_worklog()
            .withf(|key, _| key == "WL-2")
            .returning(|_, _| Err(TrackerError::Network("timed out".into())));
        let clock = clock();
        let mut session = LogSession::new(&settings(), filter(), 6., &tracker, &reminders, &clock);

        session.start().await;
        let reply = session.handle(ReplCommand::Submit).await;
        assert!(!reply.done);
        assert!(reply.text.starts_with("Failed to log work for WL-2"));
        assert!(reply.text.contains("Already logged, don't submit these again: WL-1"));
        Ok(())
    }

    #[tokio::test]
    async fn test_run_reads_commands_until_quit() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let reminders = ReminderStateStore::new(dir.path());
        let mut tracker = MockTrackerApi::new();
        tracker.expect_search().times(2).returning(|_, _| Ok(issues()));
        tracker.expect_add_worklog().never();
        let clock = clock();
        let session = LogSession::new(&settings(), filter(), 6., &tracker, &reminders, &clock)
            .with_mode(AutoDistribution::All);

        let input = "show\n\nhours 1 2\nbogus\nrefresh\nquit\nsubmit\n".as_bytes();
        session.run(input).await
    }
}
