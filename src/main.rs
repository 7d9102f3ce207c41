mod commands;
mod config;
mod date_range;
mod error;
mod event;
mod google;
mod render;
mod session;
mod utils;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use config::{Config, Overrides};
use event::NewEvent;

#[derive(Parser)]
#[command(name = "evical")]
#[command(about = "List, create and delete events in your Google Calendar")]
struct Cli {
    /// OAuth client secret downloaded from Google Cloud Console [default: credentials.json]
    #[arg(long, global = true, value_name = "PATH")]
    credentials: Option<PathBuf>,

    /// Where the authorized token is stored [default: token.json]
    #[arg(long, global = true, value_name = "PATH")]
    token: Option<PathBuf>,

    /// Calendar to operate on [default: primary]
    #[arg(long, global = true, value_name = "ID")]
    calendar: Option<String>,

    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List upcoming events, soonest first
    #[command(alias = "list-upcoming-events")]
    ListUpcoming {
        /// How many events to show
        #[arg(default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
        count: u32,
    },
    /// List the events of a month
    #[command(alias = "list-events-for-month")]
    ListMonth {
        /// Year [default: current year]
        #[arg(short, long)]
        year: Option<i32>,

        /// Month, 1-12 [default: current month]
        #[arg(short, long)]
        month: Option<u32>,
    },
    /// Create an event
    AddEvent {
        /// Event title
        #[arg(short, long)]
        title: String,

        /// Start, e.g. "2022-10-10 18:00"
        #[arg(short, long, alias = "start-datetime")]
        start: String,

        /// End, e.g. "2022-10-10 19:00"
        #[arg(short, long, alias = "end-datetime")]
        end: String,

        /// IANA time zone of start and end [default: system time zone]
        #[arg(long, alias = "tz")]
        timezone: Option<String>,

        #[arg(short, long, default_value = "Unknown")]
        location: String,

        #[arg(short, long, default_value = "No description")]
        description: String,
    },
    /// Delete an event after confirmation
    DeleteEvent {
        /// ID of the calendar event
        #[arg(short, long)]
        id: String,

        /// Delete without asking
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("An error occurred: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise warnings only, or debug output for evical with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,evical=debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(Overrides {
        credentials_path: cli.credentials,
        token_path: cli.token,
        calendar_id: cli.calendar,
    })?;

    match cli.command {
        Commands::ListUpcoming { count } => commands::list_upcoming::run(&config, count as usize).await,
        Commands::ListMonth { year, month } => commands::list_month::run(&config, year, month).await,
        Commands::AddEvent {
            title,
            start,
            end,
            timezone,
            location,
            description,
        } => {
            let event = NewEvent::parse(
                title,
                &start,
                &end,
                timezone.unwrap_or_else(event::local_timezone_name),
                location,
                description,
            )?;
            commands::add_event::run(&config, event).await
        }
        Commands::DeleteEvent { id, force } => commands::delete_event::run(&config, &id, force).await,
    }
}
