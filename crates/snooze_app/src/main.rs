use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use snooze_engine::{ClientSettings, SessionHandle, DEFAULT_BASE_URL};
use snooze_logging::LogDestination;

mod commands;
mod credentials;

#[derive(Parser)]
#[command(name = "snooze")]
#[command(about = "Browse, post and favorite stories on a Hack-or-Snooze service", long_about = None)]
struct Cli {
    /// Root URL of the story service
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Directory holding the stored credentials
    #[arg(long, default_value = ".")]
    state_dir: PathBuf,

    /// Whole-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Log destination: file, terminal, both or off
    #[arg(long, default_value = "file")]
    log: LogDestination,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// List the story feed
    Stories,
    /// Create an account and log in
    Signup {
        username: String,
        password: String,
        name: String,
    },
    /// Log in and remember the token
    Login { username: String, password: String },
    /// Forget the stored token
    Logout,
    /// Show the logged-in user
    Profile,
    /// List your favorite stories
    Favorites,
    /// List the stories you posted
    Mine,
    /// Post a new story
    Post {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        url: String,
    },
    /// Toggle the favorite flag of a story
    Favorite { story_id: String },
    /// Delete one of your own stories
    Delete { story_id: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    snooze_logging::initialize(cli.log, level);

    let settings = ClientSettings {
        base_url: cli.base_url,
        request_timeout: Duration::from_secs(cli.timeout_secs),
        ..ClientSettings::default()
    };
    let handle = SessionHandle::from_settings(settings)?;

    commands::run(&handle, &cli.state_dir, cli.command).await
}
