pub mod config;
pub mod daemon_path;
pub mod output;
pub mod process;
pub mod session;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use chrono::{Duration, Local};
use clap::{Parser, Subcommand};
use config::{process_config_command, ConfigCommand};
use output::{browse_url, TicketTable};
use process::{daemon_executable, is_daemon_running, kill_previous_daemons, restart_daemon};
use session::{describe_tracker_error, parse_total_hours, LogSession, NO_TICKETS_MESSAGE};
use tokio::io::BufReader;
use tracing::level_filters::LevelFilter;

use crate::{
    daemon::{
        fire_reminder, notifier::LogNotifier, reminder_state::ReminderStateStore,
        schedule::next_reminder, start_daemon,
    },
    engine::session::Session,
    settings::{
        store::{FileSettingsStore, SettingsStore},
        AutoDistribution, Settings,
    },
    tracker::{client::JiraClient, fetch::TicketFetcher, TrackerApi},
    utils::{
        clock::{Clock, DefaultClock},
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Worklogger", version, long_about = None)]
#[command(about = "Daily reminder and hour distributor for logging work on tracker tickets", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Starts a reminder daemon for the application")]
    Init,
    #[command(
        about = "Run a daemon directly in current console. Used for creating a daemon internally and for debugging"
    )]
    Serve,
    #[command(about = "Stop currently running daemon.")]
    Stop,
    #[command(about = "Distribute today's hours over your tickets and log them")]
    Log {
        #[arg(
            long,
            short,
            value_parser = parse_total_hours,
            help = "Total hours to distribute, 0 to 24. Defaults to defaultHours"
        )]
        total: Option<f64>,
        #[arg(
            long,
            short,
            help = "Initial distribution: none, all or activeWork. Defaults to autoDistribution"
        )]
        mode: Option<AutoDistribution>,
    },
    #[command(about = "List the tickets a log session would offer")]
    Tickets,
    #[command(about = "Manage settings")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    #[command(about = "Check the tracker URL and credentials")]
    TestConnection,
    #[command(about = "Repeat the reminder later")]
    RemindLater {
        #[arg(long, default_value_t = 30)]
        minutes: u32,
    },
    #[command(about = "Show pending reminders and daemon state")]
    Status,
    #[command(about = "Show the daily reminder right now")]
    TestNotification,
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args
        .dir
        .clone()
        .map_or_else(create_application_default_path, ensure_dir)?;
    // The daemon runs from `/`, so it must get an absolute directory.
    let app_dir = std::path::absolute(&app_dir)?;
    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    let store = FileSettingsStore::new(&app_dir);
    match args.commands {
        Commands::Init => {
            restart_daemon(&app_dir)?;
            println!("Reminder daemon started");
            Ok(())
        }
        Commands::Stop => {
            let stopped = kill_previous_daemons(&daemon_executable()?)?;
            if stopped == 0 {
                println!("No running daemon found");
            }
            Ok(())
        }
        Commands::Serve => start_daemon(app_dir).await,
        Commands::Log { total, mode } => run_log(&app_dir, &store, total, mode).await,
        Commands::Tickets => print_tickets(&store).await,
        Commands::Config { command } => process_config_command(command, &store).await,
        Commands::TestConnection => test_connection(&store).await,
        Commands::RemindLater { minutes } => remind_later(&app_dir, minutes).await,
        Commands::Status => print_status(&app_dir, &store).await,
        Commands::TestNotification => test_notification(&app_dir).await,
    }
}

fn connect(settings: &Settings) -> Result<JiraClient> {
    Ok(JiraClient::new(settings.credentials()?)?)
}

async fn run_log(
    app_dir: &Path,
    store: &FileSettingsStore,
    total: Option<f64>,
    mode: Option<AutoDistribution>,
) -> Result<()> {
    let settings = store.load().await?;
    let filter = settings.filter()?;
    let client = connect(&settings)?;
    let reminders = ReminderStateStore::new(app_dir);
    let clock = DefaultClock;

    let total = total.unwrap_or(settings.default_hours);
    let session = LogSession::new(&settings, filter, total, &client, &reminders, &clock)
        .with_mode(mode.unwrap_or(settings.auto_distribution));
    session.run(BufReader::new(tokio::io::stdin())).await
}

async fn print_tickets(store: &FileSettingsStore) -> Result<()> {
    let settings = store.load().await?;
    let filter = settings.filter()?;
    let client = connect(&settings)?;
    let today = DefaultClock.today();

    let tickets = TicketFetcher::new(&client)
        .fetch(&filter, today)
        .await
        .map_err(|e| anyhow!(describe_tracker_error(&e)))?;
    if tickets.is_empty() {
        println!("{NO_TICKETS_MESSAGE}");
        return Ok(());
    }

    let mut session = Session::new(settings.default_hours, filter.primary_statuses, today);
    let view = session.load(tickets, AutoDistribution::None);
    print!("{}", TicketTable(&view.tickets));
    if let Some(url) = settings.tracker_url() {
        println!();
        for ticket in &view.tickets {
            println!("{}  {}", ticket.key, browse_url(url, &ticket.key));
        }
    }
    Ok(())
}

async fn test_connection(store: &FileSettingsStore) -> Result<()> {
    let settings = store.load().await?;
    let client = connect(&settings)?;
    let myself = client
        .myself()
        .await
        .map_err(|e| anyhow!(describe_tracker_error(&e)))?;
    match myself.email_address {
        Some(email) => println!("Connected as {} ({email})", myself.display_name),
        None => println!("Connected as {}", myself.display_name),
    }
    Ok(())
}

async fn remind_later(app_dir: &Path, minutes: u32) -> Result<()> {
    let until = ReminderStateStore::new(app_dir)
        .snooze(DefaultClock.time(), Duration::minutes(minutes.into()))
        .await?;
    println!(
        "You will be reminded again at {}",
        until.with_timezone(&Local).format("%H:%M")
    );
    Ok(())
}

/// Fires the reminder the daemon would show, including the pending flag.
async fn test_notification(app_dir: &Path) -> Result<()> {
    fire_reminder(
        &ReminderStateStore::new(app_dir),
        &mut LogNotifier,
        DefaultClock.time(),
    )
    .await?;
    println!("Time to log your daily work hours! Run `worklogger log`.");
    Ok(())
}

async fn print_status(app_dir: &Path, store: &FileSettingsStore) -> Result<()> {
    let state = ReminderStateStore::new(app_dir).load().await?;
    let settings = store.load().await?;

    match (state.reminder_active, state.reminder_time) {
        (true, Some(time)) => println!(
            "Work log reminder pending since {}",
            time.with_timezone(&Local).format("%x %H:%M")
        ),
        (true, None) => println!("Work log reminder pending"),
        (false, _) => println!("No pending reminder"),
    }
    if let Some(until) = state.snoozed_until {
        println!(
            "Snoozed until {}",
            until.with_timezone(&Local).format("%x %H:%M")
        );
    }

    let daemon_running = is_daemon_running(&daemon_executable()?)?;
    if daemon_running {
        let next = next_reminder(&Local::now(), &settings.schedule);
        println!("Daemon running, next reminder {}", next.format("%x %H:%M"));
    } else {
        println!("Daemon not running. Start it with `worklogger init`");
    }

    match settings.tracker_url() {
        Some(url) if settings.is_configured() => println!("Tracker: {url}"),
        _ => println!("Tracker not configured. Run `worklogger config set jiraUrl <url>`"),
    }
    Ok(())
}
